use quill_orm::prelude::*;
use quill_orm::sqlx::Sqlite;
use quill_orm::{FieldKind, Row};

fn token() -> String {
    "tok-1".to_owned()
}

#[derive(Model, Debug, Clone, PartialEq)]
#[quill(table = "sessions")]
struct Session {
    #[quill(primary_key, column_type = "varchar(50)", default = "token")]
    id: Option<String>,
    #[quill(kind = "text")]
    payload: Option<String>,
    hits: i64,
    active: bool,
    #[quill(ignore)]
    scratch: Vec<u8>,
}

#[derive(Model, Debug)]
struct Label {
    #[quill(primary_key)]
    name: String,
}

#[test]
fn derive_declares_fields_in_order() {
    let schema = Session::schema::<Sqlite>().unwrap();
    assert_eq!(schema.table(), "sessions");
    assert_eq!(schema.primary_key().name(), "id");
    assert_eq!(schema.primary_key().sql_type(), "varchar(50)");

    let kinds: Vec<(&str, FieldKind)> = schema
        .fields()
        .iter()
        .map(|f| (f.name(), f.kind()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("payload", FieldKind::Text),
            ("hits", FieldKind::Integer),
            ("active", FieldKind::Boolean),
        ]
    );
    assert_eq!(Label::schema::<Sqlite>().unwrap().table(), "Label");
}

#[test]
fn derive_maps_names_to_values() {
    let mut session = Session {
        id: None,
        payload: Some("{}".into()),
        hits: 2,
        active: true,
        scratch: vec![1],
    };
    assert_eq!(session.get_value("id"), None);
    assert_eq!(session.get_value("hits"), Some(Value::Int(2)));
    assert_eq!(session.get_value("scratch"), None);

    session.set_value("id", Value::from("abc")).unwrap();
    assert_eq!(session.id.as_deref(), Some("abc"));
    assert!(matches!(
        session.set_value("scratch", Value::Null),
        Err(OrmError::UnknownField(_))
    ));

    let err = session.set_value("hits", Value::from("many")).unwrap_err();
    assert!(err.to_string().starts_with("column `hits`"));
}

#[test]
fn derive_decodes_rows_and_defaults_ignored_fields() {
    let row: Row = [
        ("id", Value::from("s1")),
        ("payload", Value::Null),
        ("hits", Value::Int(9)),
        ("active", Value::Int(1)),
    ]
    .into_iter()
    .collect();
    let session = Session::from_row(&row).unwrap();
    assert_eq!(
        session,
        Session {
            id: Some("s1".into()),
            payload: None,
            hits: 9,
            active: true,
            scratch: Vec::new(),
        }
    );
}

#[tokio::test]
async fn derived_model_persists_with_producer_default() {
    let pool = quill_orm::test_utils::memory_pool().await.unwrap();
    Quill::sync::<Sqlite, Session>(&pool).await.unwrap();

    let mut session = Session {
        id: None,
        payload: None,
        hits: 0,
        active: false,
        scratch: Vec::new(),
    };
    assert!(session.save(&pool).await.unwrap().is_success());
    assert_eq!(session.id.as_deref(), Some("tok-1"));

    let loaded = Session::find(&pool, "tok-1").await.unwrap().unwrap();
    assert_eq!(loaded, session);
}

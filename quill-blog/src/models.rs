use chrono::Utc;
use quill_orm::Model;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-ordered unique id: 15-digit millisecond timestamp, uuid4 hex, `000`.
pub fn next_id() -> String {
    format!(
        "{:015}{}000",
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// Current Unix time in fractional seconds.
pub fn now() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

#[derive(Model, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[quill(table = "users")]
pub struct User {
    #[quill(primary_key, column_type = "varchar(50)", default = "next_id")]
    pub id: Option<String>,
    #[quill(column_type = "varchar(50)")]
    pub email: String,
    /// `sha256("<id>:<client hash>")` as hex.
    #[quill(column_type = "varchar(64)")]
    pub passwd: String,
    pub admin: bool,
    #[quill(column_type = "varchar(50)")]
    pub name: String,
    #[quill(column_type = "varchar(500)")]
    pub image: String,
    #[quill(default = "now")]
    pub created_at: Option<f64>,
}

impl User {
    /// Copy safe to hand to clients.
    pub fn masked(&self) -> Self {
        Self {
            passwd: "******".to_owned(),
            ..self.clone()
        }
    }
}

#[derive(Model, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[quill(table = "blogs")]
pub struct Blog {
    #[quill(primary_key, column_type = "varchar(50)", default = "next_id")]
    pub id: Option<String>,
    #[quill(column_type = "varchar(50)")]
    pub user_id: String,
    #[quill(column_type = "varchar(50)")]
    pub user_name: String,
    #[quill(column_type = "varchar(500)")]
    pub user_image: String,
    #[quill(column_type = "varchar(50)")]
    pub name: String,
    #[quill(column_type = "varchar(200)")]
    pub summary: String,
    #[quill(kind = "text")]
    pub content: String,
    #[quill(default = "now")]
    pub created_at: Option<f64>,
}

#[derive(Model, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[quill(table = "comments")]
pub struct Comment {
    #[quill(primary_key, column_type = "varchar(50)", default = "next_id")]
    pub id: Option<String>,
    #[quill(column_type = "varchar(50)")]
    pub blog_id: String,
    #[quill(column_type = "varchar(50)")]
    pub user_id: String,
    #[quill(column_type = "varchar(50)")]
    pub user_name: String,
    #[quill(column_type = "varchar(500)")]
    pub user_image: String,
    #[quill(kind = "text")]
    pub content: String,
    #[quill(default = "now")]
    pub created_at: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Db;

    #[test]
    fn ids_are_fifty_chars_and_sortable() {
        let a = next_id();
        let b = next_id();
        assert_eq!(a.len(), 50);
        assert!(a.ends_with("000"));
        assert_ne!(a, b);
        assert!(a[..15] <= b[..15]);
    }

    #[test]
    fn schemas_match_the_mysql_ddl() {
        let users = User::schema::<Db>().unwrap();
        assert_eq!(
            users.insert_sql(),
            "INSERT INTO `users` (`email`, `passwd`, `admin`, `name`, `image`, `created_at`, `id`) VALUES (?, ?, ?, ?, ?, ?, ?)"
        );
        let blogs = Blog::schema::<Db>().unwrap();
        assert_eq!(blogs.field("content").unwrap().sql_type(), "text");
        assert_eq!(blogs.field("created_at").unwrap().sql_type(), "real");
        let comments = Comment::schema::<Db>().unwrap();
        assert_eq!(comments.primary_key().sql_type(), "varchar(50)");
    }
}

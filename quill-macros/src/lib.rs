use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type, parse_macro_input};

/// Derives `quill_orm::Model` for a struct with named fields.
///
/// Struct attribute: `#[quill(table = "users")]` (defaults to the struct name).
/// Field attributes, combinable inside one `#[quill(...)]`:
/// `primary_key`, `ignore`, `kind = "text"`, `column_type = "varchar(50)"`,
/// `default = "path::to::fn"`.
#[proc_macro_derive(Model, attributes(quill))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_model_impl(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

#[derive(Debug, Default)]
struct FieldOptions {
    primary_key: bool,
    ignore: bool,
    kind: Option<String>,
    column_type: Option<String>,
    default: Option<syn::Path>,
}

const KINDS: [&str; 5] = ["string", "boolean", "integer", "float", "text"];

fn derive_model_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let table_name = table_name(input)?;

    let all_fields = if let Data::Struct(data) = &input.data {
        if let Fields::Named(fields) = &data.fields {
            &fields.named
        } else {
            return Err(syn::Error::new_spanned(
                &data.fields,
                "Quill Model only supports structs with named fields",
            ));
        }
    } else {
        return Err(syn::Error::new_spanned(input, "Quill Model only supports structs"));
    };

    let mut declarations = Vec::new();
    let mut getters = Vec::new();
    let mut setters = Vec::new();
    let mut decoders = Vec::new();

    for field in all_fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let options = field_options(&field.attrs)?;
        if options.ignore {
            decoders.push(quote! { #ident: ::core::default::Default::default() });
            continue;
        }

        let name = ident.to_string();
        let kind = match &options.kind {
            Some(kind) => kind.clone(),
            None => infer_kind(&field.ty).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "cannot infer the column kind; add #[quill(kind = \"...\")]",
                )
            })?,
        };
        let constructor = syn::Ident::new(&kind, ident.span());

        let mut declaration = quote! { ::quill_orm::Field::#constructor(#name) };
        if options.primary_key {
            declaration = quote! { #declaration.primary_key() };
        }
        if let Some(column_type) = &options.column_type {
            declaration = quote! { #declaration.column_type(#column_type) };
        }
        if let Some(producer) = &options.default {
            declaration = quote! {
                #declaration.default_with(|| ::quill_orm::Value::from(#producer()))
            };
        }
        declarations.push(quote! { .field(#declaration) });

        getters.push(quote! {
            #name => ::quill_orm::FieldValue::to_value(&self.#ident)
        });
        setters.push(quote! {
            #name => {
                self.#ident = ::quill_orm::FieldValue::from_value(value)
                    .map_err(|err| err.for_column(#name))?;
            }
        });
        decoders.push(quote! { #ident: row.decode(#name)? });
    }

    Ok(quote! {
        impl ::quill_orm::Model for #struct_name {
            fn declare() -> ::quill_orm::SchemaBuilder {
                ::quill_orm::SchemaBuilder::new(#table_name)
                    #(#declarations)*
            }

            fn get_value(&self, name: &str) -> ::core::option::Option<::quill_orm::Value> {
                match name {
                    #(#getters,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_value(
                &mut self,
                name: &str,
                value: ::quill_orm::Value,
            ) -> ::quill_orm::OrmResult<()> {
                match name {
                    #(#setters)*
                    other => {
                        return ::core::result::Result::Err(
                            ::quill_orm::OrmError::UnknownField(other.to_owned()),
                        );
                    }
                }
                ::core::result::Result::Ok(())
            }

            fn from_row(row: &::quill_orm::Row) -> ::quill_orm::OrmResult<Self> {
                ::core::result::Result::Ok(Self {
                    #(#decoders,)*
                })
            }
        }
    })
}

fn table_name(input: &DeriveInput) -> syn::Result<String> {
    let mut table = None;
    for attr in quill_attrs(&input.attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let value: LitStr = meta.value()?.parse()?;
                table = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported quill struct attribute"))
            }
        })?;
    }
    Ok(table.unwrap_or_else(|| input.ident.to_string()))
}

fn field_options(attrs: &[Attribute]) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in quill_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("primary_key") {
                options.primary_key = true;
            } else if meta.path.is_ident("ignore") {
                options.ignore = true;
            } else if meta.path.is_ident("kind") {
                let value: LitStr = meta.value()?.parse()?;
                if !KINDS.contains(&value.value().as_str()) {
                    return Err(syn::Error::new_spanned(
                        &value,
                        "kind must be one of string, boolean, integer, float, text",
                    ));
                }
                options.kind = Some(value.value());
            } else if meta.path.is_ident("column_type") {
                let value: LitStr = meta.value()?.parse()?;
                options.column_type = Some(value.value());
            } else if meta.path.is_ident("default") {
                let value: LitStr = meta.value()?.parse()?;
                options.default = Some(value.parse()?);
            } else {
                return Err(meta.error("unsupported quill field attribute"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn quill_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("quill"))
}

/// Maps the Rust type (with `Option` peeled off) to a built-in field kind.
fn infer_kind(ty: &Type) -> Option<String> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident == "Option"
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return infer_kind(inner);
    }
    let kind = match segment.ident.to_string().as_str() {
        "String" => "string",
        "bool" => "boolean",
        "i32" | "i64" => "integer",
        "f64" => "float",
        _ => return None,
    };
    Some(kind.to_owned())
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, ext::IdentExt, parse_macro_input};

mod attrs;

use attrs::{ColumnAttrs, EntityAttrs, is_option, snake_case};

/// Implements `ymate_query::Entity` for a struct with named fields.
///
/// Struct attributes: `#[entity(name = "..", comment = "..")]` and any number of
/// `#[index(name = "..", unique, fields("a", "b"))]`. Field attributes:
/// `#[column(name, field_type, primary_key, autoincrement, length, decimals, nullable, unsigned,
/// sequence, default, comment, readonly, skip)]`.
#[proc_macro_derive(Entity, attributes(entity, index, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match derive_entity_impl(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => TokenStream::from(err.to_compile_error()),
    }
}

#[cfg(test)]
mod tests {
    use syn::parse_quote;

    use super::*;

    fn expand(input: DeriveInput) -> String {
        derive_entity_impl(&input).unwrap().to_string()
    }

    #[test]
    fn table_name_defaults_to_snake_case() {
        let tokens = expand(parse_quote! {
            struct UserProfile {
                id: i64,
                nick_name: String,
            }
        });
        assert!(tokens.contains("EntityMeta :: new (\"user_profile\")"));
        assert!(tokens.contains("\"nick_name\""));
    }

    #[test]
    fn entity_and_column_attributes_are_applied() {
        let tokens = expand(parse_quote! {
            #[entity(name = "t_user", comment = "users")]
            #[index(name = "uk_email", unique, fields("email"))]
            struct User {
                #[column(primary_key, autoincrement)]
                id: Option<i64>,
                #[column(name = "mail", length = 64, comment = "login")]
                email: String,
                #[column(field_type = "text", default = "none")]
                bio: Option<String>,
            }
        });
        assert!(tokens.contains("EntityMeta :: new (\"t_user\")"));
        assert!(tokens.contains(". comment (\"users\")"));
        assert!(tokens.contains(". primary_key (\"id\")"));
        assert!(tokens.contains(". autoincrement (true)"));
        assert!(tokens.contains("PropertyMeta :: new (\"mail\""));
        assert!(tokens.contains(". length (64u32)"));
        assert!(tokens.contains("FieldType :: Text"));
        assert!(tokens.contains("IndexMeta :: new (\"uk_email\" , true"));
        assert!(tokens.contains("\"mail\" => "));
    }

    #[test]
    fn option_fields_are_nullable_unless_keys() {
        let tokens = expand(parse_quote! {
            struct Account {
                #[column(primary_key)]
                id: Option<i64>,
                nick: Option<String>,
                #[column(nullable = true)]
                name: String,
            }
        });
        let nullable: Vec<&str> = tokens.match_indices(". nullable (").map(|(i, _)| &tokens[i..i + 17]).collect();
        assert_eq!(
            nullable,
            vec![". nullable (false", ". nullable (true)", ". nullable (true)"]
        );
    }

    #[test]
    fn skipped_fields_are_left_out() {
        let tokens = expand(parse_quote! {
            struct Session {
                id: String,
                #[column(skip)]
                cache: Vec<String>,
            }
        });
        assert!(!tokens.contains("\"cache\""));
    }

    #[test]
    fn rejects_tuple_structs_and_enums() {
        let tuple: DeriveInput = parse_quote! { struct User(i64, String); };
        assert!(derive_entity_impl(&tuple).unwrap_err().to_string().contains("named fields"));

        let enumeration: DeriveInput = parse_quote! { enum User { A, B } };
        assert!(derive_entity_impl(&enumeration).unwrap_err().to_string().contains("only supports structs"));
    }

    #[test]
    fn rejects_unknown_attributes() {
        let input: DeriveInput = parse_quote! {
            struct User {
                #[column(size = 3)]
                id: i64,
            }
        };
        assert!(derive_entity_impl(&input).unwrap_err().to_string().contains("unsupported column attribute"));

        let input: DeriveInput = parse_quote! {
            struct User {
                #[column(field_type = "money")]
                id: i64,
            }
        };
        assert!(derive_entity_impl(&input).unwrap_err().to_string().contains("unknown column type"));
    }

    #[test]
    fn index_requires_fields() {
        let input: DeriveInput = parse_quote! {
            #[index(name = "idx")]
            struct User {
                id: i64,
            }
        };
        assert!(derive_entity_impl(&input).is_err());
    }

    #[test]
    fn snake_case_handles_single_words() {
        assert_eq!(snake_case("User"), "user");
        assert_eq!(snake_case("OrderItemLog"), "order_item_log");
    }
}

fn derive_entity_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let entity = EntityAttrs::parse(&input.attrs)?;

    let all_fields = if let Data::Struct(data) = &input.data {
        if let Fields::Named(fields) = &data.fields {
            &fields.named
        } else {
            return Err(syn::Error::new_spanned(
                &data.fields,
                "Entity derive only supports structs with named fields",
            ));
        }
    } else {
        return Err(syn::Error::new_spanned(
            input,
            "Entity derive only supports structs",
        ));
    };

    let table_name = entity
        .name
        .clone()
        .unwrap_or_else(|| snake_case(&struct_name.unraw().to_string()));
    let comment = entity
        .comment
        .as_ref()
        .map(|comment| quote! { .comment(#comment) });

    let mut primary_keys = Vec::new();
    let mut properties = Vec::new();
    let mut column_names = Vec::new();
    let mut field_idents = Vec::new();

    for field in all_fields {
        let column = ColumnAttrs::parse(field)?;
        if column.skip {
            continue;
        }
        let Some(ident) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "field without a name"));
        };
        let name = column
            .name
            .clone()
            .unwrap_or_else(|| ident.unraw().to_string());
        if column.primary_key {
            primary_keys.push(name.clone());
        }

        let ty = &field.ty;
        let field_type = match &column.field_type {
            Some(variant) => quote! { ::ymate_query::FieldType::#variant },
            None => {
                let ty_name = quote!(#ty).to_string();
                quote! { ::ymate_query::FieldType::from_rust_type(#ty_name) }
            }
        };
        let nullable = column
            .nullable
            .unwrap_or(is_option(ty) && !column.primary_key);
        let autoincrement = column.autoincrement;
        let unsigned = column.unsigned;
        let readonly = column.readonly;
        let length = column.length.map(|length| quote! { .length(#length) });
        let decimals = column.decimals.map(|decimals| quote! { .decimals(#decimals) });
        let sequence = column
            .sequence
            .as_ref()
            .map(|sequence| quote! { .sequence_name(#sequence) });
        let default_value = column
            .default_value
            .as_ref()
            .map(|value| quote! { .default_value(#value) });
        let column_comment = column
            .comment
            .as_ref()
            .map(|comment| quote! { .comment(#comment) });

        properties.push(quote! {
            ::ymate_query::PropertyMeta::new(#name, #field_type)
                #length
                #decimals
                .nullable(#nullable)
                .unsigned(#unsigned)
                .autoincrement(#autoincrement)
                #sequence
                #default_value
                #column_comment
                .readonly(#readonly)
        });
        column_names.push(name);
        field_idents.push(ident);
    }

    let indexes = entity.indexes.iter().map(|index| {
        let name = &index.name;
        let unique = index.unique;
        let fields = &index.fields;
        quote! { ::ymate_query::IndexMeta::new(#name, #unique, [#(#fields),*]) }
    });

    Ok(quote! {
        impl #impl_generics ::ymate_query::Entity for #struct_name #ty_generics #where_clause {
            fn entity_meta() -> &'static ::ymate_query::EntityMeta {
                static META: ::std::sync::OnceLock<::ymate_query::EntityMeta> =
                    ::std::sync::OnceLock::new();
                META.get_or_init(|| {
                    ::ymate_query::EntityMeta::new(#table_name)
                        #comment
                        #( .primary_key(#primary_keys) )*
                        #( .property(#properties) )*
                        #( .index(#indexes) )*
                })
            }

            fn field_value(&self, name: &str) -> ::std::option::Option<::ymate_query::BindValue> {
                match name {
                    #(
                        #column_names => ::std::option::Option::Some(::ymate_query::BindValue::from(
                            ::std::clone::Clone::clone(&self.#field_idents),
                        )),
                    )*
                    _ => ::std::option::Option::None,
                }
            }
        }
    })
}

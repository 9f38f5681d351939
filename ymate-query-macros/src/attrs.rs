use syn::{Attribute, Field, Ident, LitBool, LitInt, LitStr, Token, Type, punctuated::Punctuated};

const FIELD_TYPES: &[&str] = &[
    "VARCHAR", "CHAR", "TEXT", "BOOLEAN", "BOOL", "BINARY", "TIMESTAMP", "DATE", "TIME", "INT",
    "LONG", "FLOAT", "DOUBLE", "NUMBER", "SMALLINT", "TINYINT", "BIT", "BLOB", "CLOB", "UNKNOWN",
];

/// `#[entity(...)]` plus every `#[index(...)]` on the struct.
#[derive(Debug, Default)]
pub(crate) struct EntityAttrs {
    pub name: Option<String>,
    pub comment: Option<String>,
    pub indexes: Vec<IndexAttrs>,
}

#[derive(Debug, Default)]
pub(crate) struct IndexAttrs {
    pub name: String,
    pub unique: bool,
    pub fields: Vec<String>,
}

/// `#[column(...)]` on one field.
#[derive(Debug, Default)]
pub(crate) struct ColumnAttrs {
    pub name: Option<String>,
    pub field_type: Option<Ident>,
    pub primary_key: bool,
    pub autoincrement: bool,
    pub length: Option<u32>,
    pub decimals: Option<u32>,
    pub nullable: Option<bool>,
    pub unsigned: bool,
    pub sequence: Option<String>,
    pub default_value: Option<String>,
    pub comment: Option<String>,
    pub readonly: bool,
    pub skip: bool,
}

fn flag(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<bool> {
    if meta.input.peek(Token![=]) {
        Ok(meta.value()?.parse::<LitBool>()?.value)
    } else {
        Ok(true)
    }
}

fn string(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<String> {
    Ok(meta.value()?.parse::<LitStr>()?.value())
}

fn number(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<u32> {
    meta.value()?.parse::<LitInt>()?.base10_parse()
}

/// `"TEXT"` or `"text"` to the `FieldType::Text` variant ident.
fn field_type_variant(lit: &LitStr) -> syn::Result<Ident> {
    let value = lit.value().trim().to_ascii_uppercase();
    if !FIELD_TYPES.contains(&value.as_str()) {
        return Err(syn::Error::new_spanned(
            lit,
            format!("unknown column type '{}'", lit.value()),
        ));
    }
    let mut chars = value.chars();
    let variant: String = chars
        .next()
        .into_iter()
        .chain(chars.flat_map(char::to_lowercase))
        .collect();
    Ok(Ident::new(&variant, lit.span()))
}

impl EntityAttrs {
    pub fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut parsed = Self::default();
        for attr in attrs {
            if attr.path().is_ident("entity") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        parsed.name = Some(string(&meta)?);
                    } else if meta.path.is_ident("comment") {
                        parsed.comment = Some(string(&meta)?);
                    } else {
                        return Err(meta.error("unsupported entity attribute"));
                    }
                    Ok(())
                })?;
            } else if attr.path().is_ident("index") {
                parsed.indexes.push(IndexAttrs::parse(attr)?);
            }
        }
        Ok(parsed)
    }
}

impl IndexAttrs {
    fn parse(attr: &Attribute) -> syn::Result<Self> {
        let mut index = Self::default();
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                index.name = string(&meta)?;
            } else if meta.path.is_ident("unique") {
                index.unique = flag(&meta)?;
            } else if meta.path.is_ident("fields") {
                let content;
                syn::parenthesized!(content in meta.input);
                let fields = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                index.fields = fields.iter().map(LitStr::value).collect();
            } else {
                return Err(meta.error("unsupported index attribute"));
            }
            Ok(())
        })?;
        if index.name.trim().is_empty() || index.fields.is_empty() {
            return Err(syn::Error::new_spanned(
                attr,
                "index needs a name and at least one field",
            ));
        }
        Ok(index)
    }
}

impl ColumnAttrs {
    pub fn parse(field: &Field) -> syn::Result<Self> {
        let mut column = Self::default();
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("column")) {
            attr.parse_nested_meta(|meta| {
                let Some(key) = meta.path.get_ident().map(Ident::to_string) else {
                    return Err(meta.error("unsupported column attribute"));
                };
                match key.as_str() {
                    "name" => column.name = Some(string(&meta)?),
                    "field_type" => {
                        let lit = meta.value()?.parse::<LitStr>()?;
                        column.field_type = Some(field_type_variant(&lit)?);
                    }
                    "primary_key" => column.primary_key = flag(&meta)?,
                    "autoincrement" => column.autoincrement = flag(&meta)?,
                    "length" => column.length = Some(number(&meta)?),
                    "decimals" => column.decimals = Some(number(&meta)?),
                    "nullable" => column.nullable = Some(flag(&meta)?),
                    "unsigned" => column.unsigned = flag(&meta)?,
                    "sequence" => column.sequence = Some(string(&meta)?),
                    "default" => column.default_value = Some(string(&meta)?),
                    "comment" => column.comment = Some(string(&meta)?),
                    "readonly" => column.readonly = flag(&meta)?,
                    "skip" => column.skip = flag(&meta)?,
                    _ => return Err(meta.error("unsupported column attribute")),
                }
                Ok(())
            })?;
        }
        Ok(column)
    }
}

/// `Option<..>` fields are nullable unless the attribute says otherwise.
pub(crate) fn is_option(ty: &Type) -> bool {
    match ty {
        Type::Path(path) => path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Option"),
        _ => false,
    }
}

/// `UserProfile` -> `user_profile`.
pub(crate) fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

use crate::func::Func;

/// Ordered list of column references used for projections and column lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    fields: Vec<String>,
    excluded: bool,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Formats `prefix.field alias`, skipping blank parts.
    pub fn field(prefix: Option<&str>, field: &str, alias: Option<&str>) -> String {
        let mut out = String::with_capacity(field.len() + 8);
        if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
            out.push_str(prefix);
            out.push('.');
        }
        out.push_str(field);
        if let Some(alias) = alias.map(str::trim).filter(|a| !a.is_empty()) {
            out.push(' ');
            out.push_str(alias);
        }
        out
    }

    pub fn add(mut self, field: impl Into<String>) -> Self {
        self.push(field);
        self
    }

    pub fn add_prefixed(self, prefix: &str, field: &str) -> Self {
        self.add(Self::field(Some(prefix), field, None))
    }

    pub fn add_alias(self, prefix: Option<&str>, field: &str, alias: &str) -> Self {
        self.add(Self::field(prefix, field, Some(alias)))
    }

    pub fn add_func(self, func: &Func, alias: Option<&str>) -> Self {
        self.add(Self::field(None, &func.build(), alias))
    }

    /// Appends another list and takes over its excluded flag.
    pub fn add_fields(mut self, other: &Fields) -> Self {
        self.fields.extend(other.fields.iter().cloned());
        self.excluded = other.excluded;
        self
    }

    pub fn add_all<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            self.push(field);
        }
        self
    }

    pub fn push(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !field.trim().is_empty() {
            self.fields.push(field);
        }
    }

    /// Marks the list as an exclusion list: the named columns are removed from `SELECT *` expansion.
    pub fn excluded(mut self, excluded: bool) -> Self {
        self.excluded = excluded;
        self
    }

    pub fn is_excluded(&self) -> bool {
        self.excluded
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.excluded = false;
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.fields.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.fields.clone()
    }
}

impl<S: Into<String>> FromIterator<S> for Fields {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Fields::new().add_all(iter)
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_skips_blank_prefix_and_alias() {
        assert_eq!(Fields::field(Some("u"), "name", Some("n")), "u.name n");
        assert_eq!(Fields::field(Some("  "), "name", None), "name");
        assert_eq!(Fields::field(None, "name", Some("")), "name");
    }

    #[test]
    fn add_fields_copies_excluded_flag() {
        let skip = Fields::new().add("password").excluded(true);
        let fields = Fields::new().add("id").add_fields(&skip);
        assert!(fields.is_excluded());
        assert_eq!(fields.fields(), &["id".to_owned(), "password".to_owned()]);
    }

    #[test]
    fn blank_entries_are_ignored() {
        let fields: Fields = ["a", " ", "b"].into_iter().collect();
        assert_eq!(fields.len(), 2);
        assert!(fields.contains("b"));
    }
}

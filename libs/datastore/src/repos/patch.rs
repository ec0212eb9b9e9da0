use crate::query::Scalar;

enum PatchValue {
    Set(Scalar),
    Null,
}

/// Collects touched columns from a `*Patch` struct and renders them as an
/// UPDATE SET fragment with correctly numbered placeholders.
#[derive(Default)]
pub(crate) struct PatchBuilder {
    entries: Vec<(&'static str, PatchValue)>,
}

impl PatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a non-nullable column.
    pub fn set(&mut self, column: &'static str, value: impl Into<Scalar>) {
        self.entries.push((column, PatchValue::Set(value.into())));
    }

    /// Sets a nullable column; `None` writes SQL NULL.
    pub fn set_nullable(&mut self, column: &'static str, value: Option<impl Into<Scalar>>) {
        let value = match value {
            Some(v) => PatchValue::Set(v.into()),
            None => PatchValue::Null,
        };
        self.entries.push((column, value));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders `col = $n, other = NULL, ...`; placeholder numbering starts
    /// at `first`. Returns the fragment and its binds in order.
    pub fn render(self, first: usize) -> (String, Vec<Scalar>) {
        let mut binds = Vec::new();
        let mut parts = Vec::with_capacity(self.entries.len());
        for (column, value) in self.entries {
            match value {
                PatchValue::Set(scalar) => {
                    binds.push(scalar);
                    parts.push(format!("{column} = ${}", first + binds.len() - 1));
                }
                PatchValue::Null => parts.push(format!("{column} = NULL")),
            }
        }
        (parts.join(", "), binds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_numbers_placeholders_from_first() {
        let mut b = PatchBuilder::new();
        b.set("name", "rust");
        b.set("level", 4);
        let (sql, binds) = b.render(3);
        assert_eq!(sql, "name = $3, level = $4");
        assert_eq!(binds.len(), 2);
    }

    #[test]
    fn test_nullable_none_renders_null_without_bind() {
        let mut b = PatchBuilder::new();
        b.set_nullable("category", None::<String>);
        b.set("verified", true);
        let (sql, binds) = b.render(1);
        assert_eq!(sql, "category = NULL, verified = $1");
        assert_eq!(binds, vec![Scalar::Bool(true)]);
    }

    #[test]
    fn test_nullable_some_binds_value() {
        let mut b = PatchBuilder::new();
        b.set_nullable("category", Some("backend"));
        let (sql, binds) = b.render(1);
        assert_eq!(sql, "category = $1");
        assert_eq!(binds, vec![Scalar::Text("backend".to_string())]);
    }

    #[test]
    fn test_empty_builder() {
        let b = PatchBuilder::new();
        assert!(b.is_empty());
        let (sql, binds) = b.render(1);
        assert!(sql.is_empty());
        assert!(binds.is_empty());
    }
}

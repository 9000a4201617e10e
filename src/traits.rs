/// A symbolic link from one declaration to another, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Link<'a> {
    Parameter(&'a str),
    Resource(&'a str),
    Guard(&'a str),
}

/// Anything that can point at other declarations: field values, guard
/// conditions, resources and outputs.
///
/// Links are collected rather than resolved; the builder decides whether each
/// target exists when the item is declared.
pub trait Referencing {
    /// Push every link held by this item onto `out`, in the order they appear.
    fn collect_links<'a>(&'a self, out: &mut Vec<Link<'a>>);

    /// Every link held by this item, in the order they appear.
    fn links(&self) -> Vec<Link<'_>> {
        let mut out = Vec::new();
        self.collect_links(&mut out);
        out
    }
}

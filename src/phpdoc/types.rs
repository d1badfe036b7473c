//! Doc-block data model: the parsed form of a `/** ... */` comment.

/// One `@tag` line of a doc-block.
#[derive(Debug, Clone, PartialEq)]
pub struct DocTag {
    /// Tag name without the `@`.
    pub name: String,
    /// Variable the tag binds to (`@param Type $x`, `@var Type $x`),
    /// without the `$`.
    pub var_name: Option<String>,
    /// The raw type string, e.g. `int|string` or `Foo[]`.
    pub type_string: Option<String>,
    pub description: String,
}

/// A parsed doc-block: free-text summary plus tags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocBlock {
    /// First paragraph of the comment body, before any tag.
    pub summary: Option<String>,
    pub tags: Vec<DocTag>,
}

impl DocBlock {
    pub fn tags_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DocTag> {
        self.tags.iter().filter(move |t| t.name == name)
    }

    /// The `@param` tag for a given parameter name.
    pub fn param_tag(&self, var_name: &str) -> Option<&DocTag> {
        self.tags_named("param")
            .find(|t| t.var_name.as_deref() == Some(var_name))
    }

    pub fn return_tag(&self) -> Option<&DocTag> {
        self.tags_named("return").next()
    }

    pub fn var_tag(&self) -> Option<&DocTag> {
        self.tags_named("var").next()
    }
}

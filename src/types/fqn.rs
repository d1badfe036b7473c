use std::fmt::{self, Display, Formatter};

/// A fully qualified name: the canonical string identifier of a PHP symbol.
///
/// The emitted shapes are stable and consumed as index keys:
///
/// - `Ns\Sub\Name`: namespace, class, interface, trait or top-level constant
/// - `Ns\Sub\f()`: function (the trailing `()` marks callables)
/// - `Ns\Class::m()` / `Ns\Class->m()`: static / instance method
/// - `Ns\Class::$prop` / `Ns\Class->prop`: static / instance property
/// - `Ns\Class::CONST`: class constant
///
/// The separator encodes dispatch: `::` is static, `->` is instance. The
/// `()` suffix keeps a function from colliding with a constant of the same
/// name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fqn(String);

impl Fqn {
    pub fn new(name: impl Into<String>) -> Self {
        Fqn(name.into())
    }

    /// Builds a function FQN from a namespaced name: `Ns\f` → `Ns\f()`.
    pub fn function(namespaced_name: &str) -> Self {
        Fqn(format!("{}()", namespaced_name))
    }

    /// Converts a parser FQSEN (leading `\`) into an FQN by stripping the
    /// single leading backslash.
    pub fn from_fqsen(fqsen: &str) -> Self {
        Fqn(fqsen.strip_prefix('\\').unwrap_or(fqsen).to_string())
    }

    /// `Class->member` or `Class->member()`.
    pub fn instance_member(class: &Fqn, member: &str, call: bool) -> Self {
        if call {
            Fqn(format!("{}->{}()", class.0, member))
        } else {
            Fqn(format!("{}->{}", class.0, member))
        }
    }

    /// `Class::member` / `Class::member()` / `Class::$member`.
    pub fn static_member(class: &Fqn, member: &str, variable: bool, call: bool) -> Self {
        if variable {
            Fqn(format!("{}::${}", class.0, member))
        } else if call {
            Fqn(format!("{}::{}()", class.0, member))
        } else {
            Fqn(format!("{}::{}", class.0, member))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for functions and methods (trailing `()`).
    pub fn is_callable(&self) -> bool {
        self.0.ends_with("()")
    }

    /// True if this names a class member (method, property or class const).
    pub fn is_member(&self) -> bool {
        self.0.contains("::") || self.0.contains("->")
    }

    pub fn contains_namespace_separator(&self) -> bool {
        self.name_path().contains('\\')
    }

    /// The leading `Ns\Sub\Name` portion, without any member part.
    fn name_path(&self) -> &str {
        let end = self
            .0
            .find("::")
            .into_iter()
            .chain(self.0.find("->"))
            .min()
            .unwrap_or(self.0.len());
        &self.0[..end]
    }

    /// Strips the namespace prefix, keeping member parts and the `()`
    /// suffix: `A\B\f()` → `f()`. Used for the global fallback lookup.
    pub fn last_segment(&self) -> Fqn {
        let path = self.name_path();
        match path.rfind('\\') {
            Some(pos) => Fqn(self.0[pos + 1..].to_string()),
            None => self.clone(),
        }
    }

    /// The short name of the symbol: `A\B\C->m()` → `m`, `A\B\f()` → `f`,
    /// `A\B\C` → `C`.
    pub fn name(&self) -> &str {
        let path = self.name_path();
        if path.len() == self.0.len() {
            let base = path.rsplit('\\').next().unwrap_or(path);
            return base.trim_end_matches("()");
        }
        let member = &self.0[path.len() + 2..];
        member
            .trim_start_matches('$')
            .trim_end_matches("()")
    }

    /// What contains the symbol: the class path for members, the namespace
    /// prefix otherwise. Empty for root-namespace symbols.
    pub fn container_name(&self) -> &str {
        let path = self.name_path();
        if path.len() < self.0.len() {
            return path;
        }
        match path.rfind('\\') {
            Some(pos) => &path[..pos],
            None => "",
        }
    }
}

impl Display for Fqn {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Fqn {
    fn from(value: &str) -> Self {
        Fqn::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_suffix() {
        let fqn = Fqn::function("A\\B\\f");
        assert_eq!(fqn.as_str(), "A\\B\\f()");
        assert!(fqn.is_callable());
        assert!(!fqn.is_member());
    }

    #[test]
    fn test_member_shapes() {
        let class = Fqn::new("Ns\\Widget");
        assert_eq!(
            Fqn::instance_member(&class, "draw", true).as_str(),
            "Ns\\Widget->draw()"
        );
        assert_eq!(
            Fqn::instance_member(&class, "size", false).as_str(),
            "Ns\\Widget->size"
        );
        assert_eq!(
            Fqn::static_member(&class, "make", false, true).as_str(),
            "Ns\\Widget::make()"
        );
        assert_eq!(
            Fqn::static_member(&class, "count", true, false).as_str(),
            "Ns\\Widget::$count"
        );
        assert_eq!(
            Fqn::static_member(&class, "MAX", false, false).as_str(),
            "Ns\\Widget::MAX"
        );
    }

    #[test]
    fn test_from_fqsen_strips_one_backslash() {
        assert_eq!(Fqn::from_fqsen("\\A\\B").as_str(), "A\\B");
        assert_eq!(Fqn::from_fqsen("A\\B").as_str(), "A\\B");
    }

    #[test]
    fn test_last_segment() {
        assert_eq!(Fqn::new("A\\B\\f()").last_segment().as_str(), "f()");
        assert_eq!(Fqn::new("A\\B\\C").last_segment().as_str(), "C");
        assert_eq!(Fqn::new("f()").last_segment().as_str(), "f()");
    }

    #[test]
    fn test_namespace_separator_ignores_members() {
        assert!(Fqn::new("A\\B").contains_namespace_separator());
        assert!(!Fqn::new("C::m()").contains_namespace_separator());
        assert!(Fqn::new("A\\C->p").contains_namespace_separator());
    }

    #[test]
    fn test_name_and_container() {
        assert_eq!(Fqn::new("A\\B\\C").name(), "C");
        assert_eq!(Fqn::new("A\\B\\f()").name(), "f");
        assert_eq!(Fqn::new("A\\B\\C").container_name(), "A\\B");
        assert_eq!(Fqn::new("A\\C->m()").name(), "m");
        assert_eq!(Fqn::new("A\\C->m()").container_name(), "A\\C");
        assert_eq!(Fqn::new("A\\C::$p").name(), "p");
        assert_eq!(Fqn::new("C").container_name(), "");
    }
}

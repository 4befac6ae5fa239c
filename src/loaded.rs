/// Outcome of loading one value.
///
/// `Failed` means "no value could be produced here": the problem has already been
/// reported through [`crate::LoadingContext::error`] (or deliberately swallowed, as
/// the `!fail` tag does), and containers simply skip the entry. It is distinct from
/// any legitimate value, including `None`, `false` or `0`.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Loaded<T> {
    Success(T),
    Failed,
}

impl<T> Loaded<T> {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Loaded::Success(_))
    }

    #[inline]
    pub fn is_failed(&self) -> bool {
        matches!(self, Loaded::Failed)
    }

    /// Converts to `Option`, dropping the failure marker.
    #[inline]
    pub fn ok(self) -> Option<T> {
        match self {
            Loaded::Success(value) => Some(value),
            Loaded::Failed => None,
        }
    }

    #[inline]
    pub fn as_ref(&self) -> Loaded<&T> {
        match self {
            Loaded::Success(value) => Loaded::Success(value),
            Loaded::Failed => Loaded::Failed,
        }
    }

    #[inline]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Loaded<U> {
        match self {
            Loaded::Success(value) => Loaded::Success(f(value)),
            Loaded::Failed => Loaded::Failed,
        }
    }

    #[inline]
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Loaded<U>) -> Loaded<U> {
        match self {
            Loaded::Success(value) => f(value),
            Loaded::Failed => Loaded::Failed,
        }
    }
}

impl<T> From<Option<T>> for Loaded<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Loaded::Success(value),
            None => Loaded::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn none_is_a_value_not_a_failure() {
        let loaded: Loaded<Option<u8>> = Loaded::Success(None);
        assert!(loaded.is_success());
        assert_eq!(loaded.ok(), Some(None));
    }

    #[test]
    fn combinators_keep_failure() {
        let failed: Loaded<i32> = Loaded::Failed;
        assert_eq!(failed.clone().map(|v| v + 1), Loaded::Failed);
        assert_eq!(failed.and_then(|v| Loaded::Success(v * 2)), Loaded::Failed);
        assert_eq!(Loaded::Success(2).and_then(|v| Loaded::Success(v * 2)), Loaded::Success(4));
    }
}

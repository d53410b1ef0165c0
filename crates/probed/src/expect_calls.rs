//! Call-count check for registration callbacks.
//!
//! Wraps a callback and counts how often it runs. Bootstrap calls
//! [`ExpectCalls::verify`] once every registration has happened; a mismatch
//! means a test definition was dropped or registered twice and is fatal.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{label} was called {actual} times; expected {expected}")]
pub struct CallCountMismatch {
    pub label: String,
    pub expected: usize,
    pub actual: usize,
}

#[must_use = "call verify() once registration is complete"]
pub struct ExpectCalls<F> {
    label: String,
    function: F,
    expected: usize,
    calls: usize,
}

impl<F> ExpectCalls<F> {
    pub fn new(label: impl Into<String>, function: F) -> Self {
        Self {
            label: label.into(),
            function,
            expected: 1,
            calls: 0,
        }
    }

    pub fn with_expected(mut self, expected: usize) -> Self {
        self.expected = expected;
        self
    }

    pub fn call<A, R>(&mut self, args: A) -> R
    where
        F: FnMut(A) -> R,
    {
        self.calls += 1;
        (self.function)(args)
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn expected(&self) -> usize {
        self.expected
    }

    pub fn verify(self) -> Result<(), CallCountMismatch> {
        if self.calls == self.expected {
            return Ok(());
        }
        Err(CallCountMismatch {
            label: self.label,
            expected: self.expected,
            actual: self.calls,
        })
    }
}

impl<F> std::fmt::Debug for ExpectCalls<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpectCalls")
            .field("label", &self.label)
            .field("expected", &self.expected)
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_call_verifies_by_default() {
        let mut seen = Vec::new();
        let mut register = ExpectCalls::new("register", |name: &str| seen.push(name.to_string()));
        register.call("ping");
        assert_eq!(register.calls(), 1);
        register.verify().expect("one call expected");
        assert_eq!(seen, vec!["ping"]);
    }

    #[test]
    fn zero_calls_is_a_mismatch() {
        let register = ExpectCalls::new("register", |_: ()| ());
        let err = register.verify().expect_err("never called");
        assert_eq!(
            err,
            CallCountMismatch {
                label: "register".to_string(),
                expected: 1,
                actual: 0,
            }
        );
        assert_eq!(err.to_string(), "register was called 0 times; expected 1");
    }

    #[test]
    fn duplicate_calls_are_a_mismatch() {
        let mut register = ExpectCalls::new("register", |x: u32| x * 2);
        assert_eq!(register.call(2), 4);
        assert_eq!(register.call(3), 6);
        assert_eq!(register.verify().expect_err("called twice").actual, 2);
    }

    #[test]
    fn custom_expectation() {
        let mut register = ExpectCalls::new("suite", |_: ()| ()).with_expected(3);
        assert_eq!(register.expected(), 3);
        for _ in 0..3 {
            register.call(());
        }
        register.verify().expect("three calls");
    }
}

//! Per-element result protocol
//!
//! Every stage answers one input element with exactly one `Signal`.

/// Outcome of evaluating one stage on one element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal<T> {
    /// One element produced, continue.
    Keep(T),

    /// Zero or more elements produced for one input, continue.
    ///
    /// An empty vector is equivalent to `Drop`.
    Many(Vec<T>),

    /// Stop the whole pass; the current element produces nothing.
    Abort,

    /// Discard the current element and continue.
    Drop,
}

impl<T> Signal<T> {
    /// `Some(v)` keeps, `None` drops.
    #[inline]
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Signal::Keep(v),
            None => Signal::Drop,
        }
    }

    /// Normalizes an empty expansion to `Drop`.
    #[inline]
    pub fn from_vec(values: Vec<T>) -> Self {
        if values.is_empty() {
            Signal::Drop
        } else {
            Signal::Many(values)
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, Signal::Abort)
    }

    /// Number of elements this signal contributes to the output.
    pub fn len(&self) -> usize {
        match self {
            Signal::Keep(_) => 1,
            Signal::Many(values) => values.len(),
            Signal::Abort | Signal::Drop => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append whatever this signal produced to `out`.
    ///
    /// Returns `false` when the pass must stop.
    #[inline]
    pub fn emit_into(self, out: &mut Vec<T>) -> bool {
        match self {
            Signal::Keep(v) => {
                out.push(v);
                true
            }
            Signal::Many(mut values) => {
                out.append(&mut values);
                true
            }
            Signal::Drop => true,
            Signal::Abort => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_many_is_drop() {
        assert_eq!(Signal::<i32>::from_vec(vec![]), Signal::Drop);
        assert_eq!(Signal::from_vec(vec![1, 2]), Signal::Many(vec![1, 2]));
        assert!(Signal::<i32>::Many(vec![]).is_empty());
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Signal::from_option(Some(3)), Signal::Keep(3));
        assert_eq!(Signal::<i32>::from_option(None), Signal::Drop);
    }

    #[test]
    fn test_emit_into() {
        let mut out = vec![0];

        assert!(Signal::Keep(1).emit_into(&mut out));
        assert!(Signal::Many(vec![2, 3]).emit_into(&mut out));
        assert!(Signal::Drop.emit_into(&mut out));
        assert!(!Signal::Abort.emit_into(&mut out));

        assert_eq!(out, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_len() {
        assert_eq!(Signal::Keep('a').len(), 1);
        assert_eq!(Signal::Many(vec!['a', 'b']).len(), 2);
        assert_eq!(Signal::<char>::Abort.len(), 0);
        assert!(Signal::<char>::Abort.is_abort());
    }
}

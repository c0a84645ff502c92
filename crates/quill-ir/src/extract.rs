//! Unique-match searches over IR collections
//!
//! Queries such as "the function named X" must match at most once; a second
//! match indicates a malformed module and is reported rather than silently
//! taking the first hit.

use thiserror::Error;

/// A search expected to match at most once matched again
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("query matched more than one item")]
    MultipleMatches,
}

/// Find the single item satisfying `predicate`.
///
/// Returns `Ok(None)` when nothing matches. The scan continues past the
/// first hit so a duplicate is always detected.
pub fn find_unique<'a, T, I, P>(items: I, mut predicate: P) -> Result<Option<&'a T>, ExtractError>
where
    I: IntoIterator<Item = &'a T>,
    P: FnMut(&T) -> bool,
{
    let mut found = None;
    for item in items {
        if predicate(item) {
            if found.is_some() {
                return Err(ExtractError::MultipleMatches);
            }
            found = Some(item);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_match_is_none() {
        let items = [1, 2, 3];
        assert_eq!(find_unique(&items, |&n| n > 5), Ok(None));
    }

    #[test]
    fn single_match_is_returned() {
        let items = [1, 2, 3];
        assert_eq!(find_unique(&items, |&n| n == 2), Ok(Some(&2)));
    }

    #[test]
    fn second_match_is_an_error() {
        let items = [1, 2, 2];
        assert_eq!(find_unique(&items, |&n| n == 2), Err(ExtractError::MultipleMatches));
    }
}

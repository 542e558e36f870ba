//! Token boundaries of an extraction.
//!
//! Both modes start at the leading comment block above a declaration. Declaration
//! mode ends before the body (the signature); definition mode ends at the
//! declaration's own stop token.

use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::Error;
use crate::tokens::TokenStream;
use crate::types::{Declaration, DeclarationKind, InclusionMode};

/// First and last token indices to extract for `declaration` in `mode`.
///
/// # Errors
///
/// Returns `Error::BodyNotFound` if an object-initializer property has no
/// opening brace between its start and stop tokens.
pub fn extraction_range(
    tokens: &TokenStream,
    declaration: &Declaration,
    mode: InclusionMode,
    file: &Path,
) -> Result<RangeInclusive<usize>, Error> {
    let first = find_first_token(tokens, declaration.start_token);
    let last = match mode {
        InclusionMode::Declaration => find_last_token(tokens, declaration, file)?,
        InclusionMode::Definition => declaration.stop_token,
    };

    tracing::debug!(
        identifier = %declaration.name,
        ?mode,
        first,
        last,
        "extraction range"
    );
    return Ok(first..=last.max(first));
}

/// Scan backward over hidden or blank tokens; start right after the first
/// significant token above the declaration. With nothing significant above,
/// start at the top of the file so a leading comment block is kept.
pub fn find_first_token(tokens: &TokenStream, start_token: usize) -> usize {
    let mut current = start_token;
    while let Some(previous) = current.checked_sub(1) {
        if !tokens.is_trivia(previous) {
            return current;
        }
        current = previous;
    }
    return current;
}

/// End of the declaration-only range.
///
/// # Errors
///
/// Returns `Error::BodyNotFound` for an object initializer without a brace.
fn find_last_token(
    tokens: &TokenStream,
    declaration: &Declaration,
    file: &Path,
) -> Result<usize, Error> {
    return match declaration.kind {
        DeclarationKind::Class | DeclarationKind::Function => Ok(declaration
            .body_start_token
            .map_or(declaration.stop_token, |body| return body.saturating_sub(1))),
        DeclarationKind::Property => match declaration.object_initializer {
            Some(value) => {
                let brace = find_body_start(tokens, declaration, value, file)?;
                Ok(brace.saturating_sub(2))
            },
            None => Ok(declaration.stop_token),
        },
    };
}

/// Linear scan for the object body's opening brace, from the initializer
/// value up to the declaration's stop token. Braces in a type annotation come
/// before the value and are skipped. Braces inside string fragments are
/// leaves of another kind and do not match.
///
/// # Errors
///
/// Returns `Error::BodyNotFound` if no `{` token lies in between.
fn find_body_start(
    tokens: &TokenStream,
    declaration: &Declaration,
    value: usize,
    file: &Path,
) -> Result<usize, Error> {
    let from = value.max(declaration.start_token.saturating_add(1));
    return (from..declaration.stop_token)
        .find(|&i| return tokens.get(i).is_some_and(|t| return t.kind == "{"))
        .ok_or_else(|| {
            return Error::BodyNotFound {
                file: file.to_path_buf(),
                identifier: declaration.name.clone(),
            };
        });
}

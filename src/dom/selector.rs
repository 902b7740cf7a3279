//! Compound CSS selector subset used by [`MemoryDocument`](super::MemoryDocument).
//!
//! Supported: an optional tag (or `*`) followed by any number of `#id`, `.class`,
//! `[attr]`, and `[attr=value]` (value optionally quoted). Combinators are rejected.

// self
use crate::_prelude::*;

/// Parsed compound selector.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
	tag: Option<String>,
	id: Option<String>,
	classes: Vec<String>,
	attributes: Vec<(String, Option<String>)>,
}
impl Selector {
	/// Parses a selector, returning `None` for anything outside the supported subset.
	pub fn parse(input: &str) -> Option<Self> {
		let input = input.trim();

		if input.is_empty() {
			return None;
		}

		let mut chars = input.chars().peekable();
		let mut selector = Selector::default();

		if chars.peek() == Some(&'*') {
			chars.next();
		} else {
			let tag = take_ident(&mut chars);

			if !tag.is_empty() {
				selector.tag = Some(tag.to_ascii_lowercase());
			}
		}

		while let Some(ch) = chars.next() {
			match ch {
				'#' => {
					let id = take_ident(&mut chars);

					if id.is_empty() {
						return None;
					}

					selector.id = Some(id);
				},
				'.' => {
					let class = take_ident(&mut chars);

					if class.is_empty() {
						return None;
					}

					selector.classes.push(class);
				},
				'[' => selector.attributes.push(take_attribute(&mut chars)?),
				_ => return None,
			}
		}

		Some(selector)
	}

	/// Tests the selector against an element's tag and attributes.
	pub fn matches(&self, tag: &str, attributes: &BTreeMap<String, String>) -> bool {
		if self.tag.as_deref().is_some_and(|expected| !expected.eq_ignore_ascii_case(tag)) {
			return false;
		}
		if self.id.as_deref().is_some_and(|id| attributes.get("id").map(String::as_str) != Some(id))
		{
			return false;
		}
		if !self.classes.is_empty() {
			let class_list = attributes.get("class").map(String::as_str).unwrap_or_default();

			if !self.classes.iter().all(|class| class_list.split_whitespace().any(|c| c == class)) {
				return false;
			}
		}

		self.attributes.iter().all(|(name, expected)| match (attributes.get(name), expected) {
			(Some(_), None) => true,
			(Some(actual), Some(expected)) => actual == expected,
			(None, _) => false,
		})
	}
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

fn take_ident(chars: &mut Chars) -> String {
	let mut buf = String::new();

	while let Some(&ch) = chars.peek() {
		if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
			buf.push(ch);
			chars.next();
		} else {
			break;
		}
	}

	buf
}

fn take_attribute(chars: &mut Chars) -> Option<(String, Option<String>)> {
	let name = take_ident(chars);

	if name.is_empty() {
		return None;
	}

	match chars.next()? {
		']' => Some((name, None)),
		'=' => {
			let value = match chars.peek() {
				Some(&quote @ ('"' | '\'')) => {
					chars.next();

					let mut buf = String::new();

					loop {
						match chars.next()? {
							ch if ch == quote => break,
							ch => buf.push(ch),
						}
					}

					buf
				},
				_ => take_ident(chars),
			};

			(chars.next()? == ']').then_some((name, Some(value)))
		},
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn attrs(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
		pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[test]
	fn compound_selectors_match() {
		let selector = Selector::parse("input#number.field[data-recurly=\"number\"]")
			.expect("Compound selector should parse.");
		let element = attrs(&[("id", "number"), ("class", "field wide"), ("data-recurly", "number")]);

		assert!(selector.matches("INPUT", &element));
		assert!(!selector.matches("div", &element));
		assert!(!selector.matches("input", &attrs(&[("id", "number")])));
	}

	#[test]
	fn attribute_presence_and_wildcards() {
		let selector = Selector::parse("*[data-event]").expect("Wildcard selector should parse.");

		assert!(selector.matches("div", &attrs(&[("data-event", "load")])));
		assert!(!selector.matches("div", &attrs(&[])));
	}

	#[test]
	fn unsupported_syntax_is_rejected() {
		assert_eq!(Selector::parse(""), None);
		assert_eq!(Selector::parse("form input"), None);
		assert_eq!(Selector::parse("div > span"), None);
		assert_eq!(Selector::parse("#"), None);
		assert_eq!(Selector::parse("[name=\"unterminated"), None);
	}
}

// Copyright (c) The parse2junit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// An error that occurs while serializing a [`Report`](crate::Report).
///
/// Returned by [`Report::serialize`](crate::Report::serialize) and
/// [`Report::to_string`](crate::Report::to_string).
#[derive(Debug, Error)]
#[error("error serializing JUnit report")]
pub struct SerializeError {
    #[from]
    inner: quick_xml::Error,
}

/// An error that occurs while reading a [`Report`](crate::Report) from XML.
///
/// Returned by [`Report::deserialize_str`](crate::Report::deserialize_str).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeserializeError {
    /// The underlying XML was malformed.
    #[error("malformed JUnit XML")]
    Xml(#[from] quick_xml::Error),

    /// The document ended while an element was still open.
    #[error("unexpected end of document inside <{element}>")]
    UnexpectedEof {
        /// The element that was left open.
        element: String,
    },

    /// The document contained no root element.
    #[error("document has no root element")]
    MissingRoot,

    /// The root element was neither `<testsuites>` nor `<testsuite>`.
    #[error("unexpected root element <{name}> (expected <testsuites> or <testsuite>)")]
    UnexpectedRoot {
        /// The name of the root element.
        name: String,
    },

    /// An attribute had a value that could not be interpreted.
    #[error("invalid value `{value}` for attribute `{attribute}` on <{element}>")]
    InvalidAttribute {
        /// The element carrying the attribute.
        element: &'static str,
        /// The attribute name.
        attribute: &'static str,
        /// The raw attribute value.
        value: String,
    },
}

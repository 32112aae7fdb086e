//! Configuration options for writers and navigators.
//!
//! This module provides the builder-style option types:
//!
//! - [`WriterOptions`]: text layout and the handling of extended kinds in text
//! - [`ExtendedTypeHandling`]: how a text writer represents kinds JSON lacks
//! - [`NavigatorOptions`]: typed-envelope recognition and nesting limits
//!
//! ## Examples
//!
//! ```rust
//! use dual_json::{create_writer, ExtendedTypeHandling, SerializationFormat, WriterOptions};
//!
//! // Pretty text with 4-space indentation
//! let options = WriterOptions::pretty().with_indent(4);
//! let mut writer = create_writer(SerializationFormat::Text, options).unwrap();
//!
//! // Lossy text: narrow integers become plain numbers
//! let options = WriterOptions::new().with_extended_types(ExtendedTypeHandling::Plain);
//! let mut writer = create_writer(SerializationFormat::Text, options).unwrap();
//! writer.write_int8_value(5).unwrap();
//! assert_eq!(&*writer.result().unwrap(), b"5");
//! ```

/// How a text writer represents kinds that have no JSON counterpart.
///
/// - **Envelope**: default, lossless `{"$t": code, "$v": value}` objects
/// - **Plain**: bare numbers for numeric kinds, a string for Guid, a base64 string for Binary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ExtendedTypeHandling {
    #[default]
    Envelope,
    Plain,
}

/// Configuration options for writers.
///
/// Binary writers only look at `initial_capacity`.
///
/// # Examples
///
/// ```rust
/// use dual_json::WriterOptions;
///
/// // Default compact options
/// let options = WriterOptions::new();
/// assert!(!options.pretty);
///
/// // Pretty-printed with 2-space indentation
/// let options = WriterOptions::pretty();
/// assert_eq!(options.indent, 2);
/// ```
#[derive(Clone, Debug)]
pub struct WriterOptions {
    pub pretty: bool,
    pub indent: usize,
    pub extended_types: ExtendedTypeHandling,
    pub initial_capacity: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        WriterOptions {
            pretty: false,
            indent: 2,
            extended_types: ExtendedTypeHandling::default(),
            initial_capacity: 256,
        }
    }
}

impl WriterOptions {
    /// Creates default options (compact text, envelopes for extended kinds).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for pretty-printed text with newlines and indentation.
    #[must_use]
    pub fn pretty() -> Self {
        WriterOptions {
            pretty: true,
            ..Default::default()
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Default is 2. Only affects pretty-printed output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_extended_types(mut self, handling: ExtendedTypeHandling) -> Self {
        self.extended_types = handling;
        self
    }

    /// Sets the number of bytes the output buffer reserves up front.
    #[must_use]
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}

/// Configuration options for navigators.
///
/// # Examples
///
/// ```rust
/// use dual_json::NavigatorOptions;
///
/// let options = NavigatorOptions::new()
///     .with_envelopes(false)
///     .with_max_depth(64);
/// assert!(!options.recognize_envelopes);
/// ```
#[derive(Clone, Debug)]
pub struct NavigatorOptions {
    /// Present `{"$t": .., "$v": ..}` objects as their extended kind.
    pub recognize_envelopes: bool,
    /// Deepest container nesting accepted by parsing and recursive walks.
    pub max_depth: usize,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        NavigatorOptions {
            recognize_envelopes: true,
            max_depth: 256,
        }
    }
}

impl NavigatorOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_envelopes(mut self, recognize: bool) -> Self {
        self.recognize_envelopes = recognize;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

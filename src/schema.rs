use std::fmt;

use crate::file::FormFile;

/// How a property is rendered into body parts.
///
/// Computed once per property from its declared shape, never from a
/// runtime value; the runtime value only decides between present and
/// absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The property holds a single file-like value.
    File,
    /// The property holds an ordered container of scalars or files.
    /// Strings are scalars, not collections of characters.
    Collection,
    /// Anything else with a textual rendering.
    Scalar,
}

/// A value in one of the recognized scalar kinds.
///
/// Integers, floats, booleans, characters and text map directly via
/// `From`; anything else with a `Display` rendering (decimals,
/// identifiers, timestamps) goes through [`ScalarValue::render`].
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    Text(String),
    /// Captured `Display` rendering of a kind without its own variant.
    Rendered(String),
}

impl ScalarValue {
    /// Capture the `Display` rendering of any other scalar kind.
    pub fn render(value: impl fmt::Display) -> Self {
        ScalarValue::Rendered(value.to_string())
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(value) => write!(f, "{value}"),
            ScalarValue::Int(value) => write!(f, "{value}"),
            ScalarValue::UInt(value) => write!(f, "{value}"),
            ScalarValue::Float(value) => write!(f, "{value}"),
            ScalarValue::Char(value) => write!(f, "{value}"),
            ScalarValue::Text(value) | ScalarValue::Rendered(value) => f.write_str(value),
        }
    }
}

macro_rules! scalar_from_signed {
    ($($kind:ty),*) => {
        $(impl From<$kind> for ScalarValue {
            fn from(value: $kind) -> Self {
                ScalarValue::Int(value.into())
            }
        })*
    };
}

macro_rules! scalar_from_unsigned {
    ($($kind:ty),*) => {
        $(impl From<$kind> for ScalarValue {
            fn from(value: $kind) -> Self {
                ScalarValue::UInt(value.into())
            }
        })*
    };
}

scalar_from_signed!(i8, i16, i32, i64);
scalar_from_unsigned!(u8, u16, u32, u64);

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Bool(value)
    }
}

impl From<char> for ScalarValue {
    fn from(value: char) -> Self {
        ScalarValue::Char(value)
    }
}

impl From<f32> for ScalarValue {
    fn from(value: f32) -> Self {
        ScalarValue::Float(value.into())
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float(value)
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Text(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Text(value.to_owned())
    }
}

/// Runtime value extracted from one property of a request.
///
/// `Absent` properties contribute nothing to the body, not even an empty
/// part.
pub enum FormValue<'a> {
    /// No value to encode.
    Absent,
    /// A single scalar, rendered as one text part.
    Scalar(ScalarValue),
    /// A single file-like value, copied into one file part.
    File(&'a dyn FormFile),
    /// A collection of scalars, one text part per element.
    Scalars(Vec<ScalarValue>),
    /// A collection of files, one file part per element.
    Files(Vec<&'a dyn FormFile>),
    /// A collection element kind with no multipart mapping; carries the
    /// debug rendering reported in the error.
    Unsupported(String),
}

impl<'a> FormValue<'a> {
    pub fn from_scalar<S>(value: Option<S>) -> Self
    where
        S: Into<ScalarValue>,
    {
        match value {
            Some(value) => FormValue::Scalar(value.into()),
            None => FormValue::Absent,
        }
    }

    pub fn from_scalars<S, I>(values: Option<I>) -> Self
    where
        S: Into<ScalarValue>,
        I: IntoIterator<Item = S>,
    {
        match values {
            Some(values) => FormValue::Scalars(values.into_iter().map(Into::into).collect()),
            None => FormValue::Absent,
        }
    }

    pub fn from_file<F>(file: Option<&'a F>) -> Self
    where
        F: FormFile,
    {
        match file {
            Some(file) => FormValue::File(file),
            None => FormValue::Absent,
        }
    }

    pub fn from_files<F>(files: Option<&'a [F]>) -> Self
    where
        F: FormFile,
    {
        match files {
            Some(files) => FormValue::Files(files.iter().map(|file| file as &dyn FormFile).collect()),
            None => FormValue::Absent,
        }
    }

    /// Mark a collection value whose element kind cannot be mapped to a
    /// text or file part. Encoding a request that yields this fails with
    /// [`EncodeError::UnsupportedValue`](crate::EncodeError::UnsupportedValue).
    pub fn unsupported(value: &dyn fmt::Debug) -> Self {
        FormValue::Unsupported(format!("{value:?}"))
    }
}

/// Type-level record of how one property of `T` is named, classified and
/// read.
pub struct PropertyDescriptor<T> {
    name: &'static str,
    classification: Classification,
    accessor: for<'a> fn(&'a T) -> FormValue<'a>,
}

impl<T> PropertyDescriptor<T> {
    /// Descriptor for a property declared as a single file.
    ///
    /// An accessor that returns anything other than `FormValue::File` or
    /// `FormValue::Absent` from a file property is skipped during
    /// encoding rather than failing the call.
    pub fn file(name: &'static str, accessor: for<'a> fn(&'a T) -> FormValue<'a>) -> Self {
        PropertyDescriptor {
            name,
            classification: Classification::File,
            accessor,
        }
    }

    /// Descriptor for a property declared as an ordered container of
    /// scalars or files.
    pub fn collection(name: &'static str, accessor: for<'a> fn(&'a T) -> FormValue<'a>) -> Self {
        PropertyDescriptor {
            name,
            classification: Classification::Collection,
            accessor,
        }
    }

    /// Descriptor for any other property with a textual rendering.
    pub fn scalar(name: &'static str, accessor: for<'a> fn(&'a T) -> FormValue<'a>) -> Self {
        PropertyDescriptor {
            name,
            classification: Classification::Scalar,
            accessor,
        }
    }

    /// Field name used for every part this property produces.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub(crate) fn read<'a>(&self, request: &'a T) -> FormValue<'a> {
        (self.accessor)(request)
    }
}

impl<T> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("classification", &self.classification)
            .finish()
    }
}

/// A request type that can describe its own properties.
///
/// Descriptors are returned in declaration order; that order is the order
/// their parts appear in the encoded body. A type with no properties
/// returns an empty vector and encodes to an empty body.
pub trait FormRequest: Sized + 'static {
    fn properties() -> Vec<PropertyDescriptor<Self>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::MemoryFile;

    struct Ping {
        message: Option<String>,
    }

    impl FormRequest for Ping {
        fn properties() -> Vec<PropertyDescriptor<Self>> {
            vec![PropertyDescriptor::scalar("Message", |r| {
                FormValue::from_scalar(r.message.as_deref())
            })]
        }
    }

    struct OrderId(u32);

    impl fmt::Display for OrderId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "order-{}", self.0)
        }
    }

    #[test]
    fn scalars_render_their_default_text() {
        assert_eq!(ScalarValue::from(42i32).to_string(), "42");
        assert_eq!(ScalarValue::from(255u8).to_string(), "255");
        assert_eq!(ScalarValue::from(true).to_string(), "true");
        assert_eq!(ScalarValue::from('a').to_string(), "a");
        assert_eq!(ScalarValue::from(2.5f64).to_string(), "2.5");
        assert_eq!(ScalarValue::from("hello").to_string(), "hello");
        assert_eq!(ScalarValue::render(OrderId(7)).to_string(), "order-7");
    }

    #[test]
    fn constructors_fix_the_classification() {
        let properties = Ping::properties();
        assert_eq!(properties[0].name(), "Message");
        assert_eq!(properties[0].classification(), Classification::Scalar);

        let file = PropertyDescriptor::<Ping>::file("Upload", |_| FormValue::Absent);
        assert_eq!(file.classification(), Classification::File);

        let collection = PropertyDescriptor::<Ping>::collection("Items", |_| FormValue::Absent);
        assert_eq!(collection.classification(), Classification::Collection);
    }

    #[test]
    fn helpers_map_none_to_absent() {
        assert!(matches!(FormValue::from_scalar(None::<i64>), FormValue::Absent));
        assert!(matches!(
            FormValue::from_scalars(None::<Vec<&str>>),
            FormValue::Absent
        ));
        assert!(matches!(
            FormValue::from_file(None::<&MemoryFile>),
            FormValue::Absent
        ));
        assert!(matches!(
            FormValue::from_files(None::<&[MemoryFile]>),
            FormValue::Absent
        ));
    }

    #[test]
    fn accessor_reads_the_runtime_value() {
        let properties = Ping::properties();

        let present = Ping {
            message: Some("pong".into()),
        };
        match properties[0].read(&present) {
            FormValue::Scalar(value) => assert_eq!(value.to_string(), "pong"),
            _ => panic!("expected a scalar"),
        }

        let absent = Ping { message: None };
        assert!(matches!(properties[0].read(&absent), FormValue::Absent));
    }

    #[test]
    fn unsupported_captures_the_debug_rendering() {
        let weird = vec![(1, 2)];
        match FormValue::unsupported(&weird) {
            FormValue::Unsupported(value) => assert_eq!(value, "[(1, 2)]"),
            _ => panic!("expected unsupported"),
        }
    }
}

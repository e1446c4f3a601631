//! Serializer identifiers and payload encoding.
//!
//! Hosts name serializers the way Kafka's Java client does
//! (`org.apache.kafka.common.serialization.StringSerializer`), so both the
//! fully-qualified class names and short aliases are accepted here. The
//! payload handed over by the host is always text; each serializer decides how
//! that text becomes bytes on the wire.

use std::borrow::Cow;

use crate::error::{Result, SamplerError};

const SERIALIZATION_PACKAGE: &str = "org.apache.kafka.common.serialization";

/// How a message key or value is encoded before it is handed to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serializer {
    /// UTF-8 text.
    String,
    /// Raw bytes, passed through untouched.
    ByteArray,
    /// Decimal text parsed into a big-endian `i64`.
    Long,
    /// Decimal text parsed into a big-endian `i32`.
    Integer,
    /// Decimal text parsed into a big-endian `i16`.
    Short,
    /// Text parsed into a big-endian IEEE-754 `f64`.
    Double,
    /// Text parsed into a big-endian IEEE-754 `f32`.
    Float,
}

impl Serializer {
    /// Fully-qualified Kafka class name for this serializer.
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::String => "org.apache.kafka.common.serialization.StringSerializer",
            Self::ByteArray => "org.apache.kafka.common.serialization.ByteArraySerializer",
            Self::Long => "org.apache.kafka.common.serialization.LongSerializer",
            Self::Integer => "org.apache.kafka.common.serialization.IntegerSerializer",
            Self::Short => "org.apache.kafka.common.serialization.ShortSerializer",
            Self::Double => "org.apache.kafka.common.serialization.DoubleSerializer",
            Self::Float => "org.apache.kafka.common.serialization.FloatSerializer",
        }
    }

    fn short_name(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::ByteArray => "ByteArray",
            Self::Long => "Long",
            Self::Integer => "Integer",
            Self::Short => "Short",
            Self::Double => "Double",
            Self::Float => "Float",
        }
    }

    /// Encode a payload. Pass-through encodings borrow the input.
    pub fn serialize<'a>(&self, data: &'a [u8]) -> Result<Cow<'a, [u8]>> {
        match self {
            Self::ByteArray => Ok(Cow::Borrowed(data)),
            Self::String => {
                self.as_text(data)?;
                Ok(Cow::Borrowed(data))
            }
            Self::Long => Ok(Cow::Owned(self.parse::<i64>(data)?.to_be_bytes().to_vec())),
            Self::Integer => Ok(Cow::Owned(self.parse::<i32>(data)?.to_be_bytes().to_vec())),
            Self::Short => Ok(Cow::Owned(self.parse::<i16>(data)?.to_be_bytes().to_vec())),
            Self::Double => Ok(Cow::Owned(self.parse::<f64>(data)?.to_be_bytes().to_vec())),
            Self::Float => Ok(Cow::Owned(self.parse::<f32>(data)?.to_be_bytes().to_vec())),
        }
    }

    fn as_text<'a>(&self, data: &'a [u8]) -> Result<&'a str> {
        std::str::from_utf8(data).map_err(|e| SamplerError::Serialize {
            serializer: self.short_name(),
            reason: e.to_string(),
        })
    }

    fn parse<T>(&self, data: &[u8]) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let text = self.as_text(data)?.trim();
        text.parse::<T>().map_err(|e| SamplerError::Serialize {
            serializer: self.short_name(),
            reason: format!("'{text}': {e}"),
        })
    }
}

impl std::fmt::Display for Serializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.class_name())
    }
}

impl std::str::FromStr for Serializer {
    type Err = SamplerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Fully-qualified names must live in Kafka's serialization package
        let simple = match trimmed.rsplit_once('.') {
            Some((package, class)) if package == SERIALIZATION_PACKAGE => class,
            Some(_) => return Err(SamplerError::UnknownSerializer(s.to_string())),
            None => trimmed,
        };

        match simple.to_lowercase().as_str() {
            "stringserializer" | "string" | "utf8" | "utf-8" => Ok(Self::String),
            "bytearrayserializer" | "bytesserializer" | "bytebufferserializer" | "bytes"
            | "byte-array" | "bytearray" => Ok(Self::ByteArray),
            "longserializer" | "long" | "i64" => Ok(Self::Long),
            "integerserializer" | "integer" | "int" | "i32" => Ok(Self::Integer),
            "shortserializer" | "short" | "i16" => Ok(Self::Short),
            "doubleserializer" | "double" | "f64" => Ok(Self::Double),
            "floatserializer" | "float" | "f32" => Ok(Self::Float),
            _ => Err(SamplerError::UnknownSerializer(s.to_string())),
        }
    }
}

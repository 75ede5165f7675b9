use std::fmt::Debug;
use std::sync::LazyLock;

use bytes::Bytes;
use headers::ContentType;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors raised by a [`Codec`] while encoding or decoding a payload.
#[derive(Debug, derive_more::Error, derive_more::Display)]
pub enum CodecError {
    /// The value could not be encoded to the wire format.
    #[display("failed to encode value: {source}")]
    Encode {
        /// The underlying serializer error.
        source: serde_json::Error,
    },

    /// The payload could not be decoded into the expected type.
    #[display("failed to decode value at '{path}': {source}")]
    Decode {
        /// Path to the offending element inside the payload.
        path: String,
        /// The underlying deserializer error.
        source: serde_json::Error,
    },

    /// Failure reported by a codec that is not backed by `serde_json`.
    #[display("{format} codec error: {message}")]
    Other {
        /// Name of the wire format.
        format: &'static str,
        /// Description of the failure.
        message: String,
    },
}

/// Serializer collaborator used for request and response bodies.
///
/// The executor only encodes request bodies and decodes response bodies through
/// this trait, so swapping the wire format never touches the pipeline.
pub trait Codec: Debug + Send + Sync + 'static {
    /// Content type set on requests carrying an encoded body.
    fn content_type(&self) -> ContentType;

    /// Encodes a value to wire bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] when the value cannot be represented in the wire format.
    fn encode<T>(&self, value: &T) -> Result<Bytes, CodecError>
    where
        T: Serialize + ?Sized;

    /// Decodes wire bytes into a value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError`] on malformed input or when the payload does not match `T`.
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned;
}

static JSON_UTF_8: LazyLock<mime::Mime> = LazyLock::new(|| {
    "application/json; charset=utf-8"
        .parse()
        .expect("a valid media type")
});

/// JSON codec based on `serde_json`.
///
/// Decoding goes through `serde_path_to_error` so failures point at the
/// offending element, e.g. `failed to decode value at 'items[2].id': ...`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> ContentType {
        // `ContentType::json()` has no charset parameter
        ContentType::from(JSON_UTF_8.clone())
    }

    fn encode<T>(&self, value: &T) -> Result<Bytes, CodecError>
    where
        T: Serialize + ?Sized,
    {
        let data = serde_json::to_vec(value).map_err(|source| CodecError::Encode { source })?;
        Ok(Bytes::from(data))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        let mut deserializer = serde_json::Deserializer::from_slice(bytes);
        let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|err| {
            let path = err.path().to_string();
            CodecError::Decode {
                path,
                source: err.into_inner(),
            }
        })?;
        // reject trailing characters like `serde_json::from_slice` does
        deserializer.end().map_err(|source| CodecError::Decode {
            path: ".".to_string(),
            source,
        })?;
        Ok(value)
    }
}

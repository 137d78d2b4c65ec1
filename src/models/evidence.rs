use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::booking::GeoPoint;

/// A binary artifact (photo, signature) in its transportable form: the raw
/// bytes are carried as standard base64 so the whole bundle serializes to
/// plain JSON for the durable queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub content_type: String,
    pub data: String,
    pub uploaded_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
}

impl Attachment {
    pub fn from_bytes(
        content_type: impl Into<String>,
        bytes: &[u8],
        uploaded_at: DateTime<Utc>,
        location: Option<GeoPoint>,
    ) -> Self {
        Self {
            content_type: content_type.into(),
            data: STANDARD.encode(bytes),
            uploaded_at,
            location,
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(&self.data)
    }
}

/// Everything a caller may attach to a single transition attempt. All fields
/// are optional here; the transition policy decides what each target status
/// actually requires.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub load_photo: Option<Attachment>,
    pub sealed: Option<bool>,
    pub seal_number: Option<String>,
    pub offload_photo: Option<Attachment>,
    pub pod_photo: Option<Attachment>,
    pub signature: Option<Attachment>,
    pub pin: Option<String>,
    pub location: Option<GeoPoint>,
}

impl EvidenceBundle {
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        [
            self.load_photo.as_ref(),
            self.offload_photo.as_ref(),
            self.pod_photo.as_ref(),
            self.signature.as_ref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// Evidence accumulated on a booking across its confirmed transitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliveryEvidence {
    pub collection_photo: Option<Attachment>,
    pub sealed: Option<bool>,
    pub seal_number: Option<String>,
    pub collection_location: Option<GeoPoint>,
    pub offload_photo: Option<Attachment>,
    pub pod_photo: Option<Attachment>,
    pub signature: Option<Attachment>,
    pub delivery_location: Option<GeoPoint>,
}

//! Types exchanged with the booking API

use std::path::Path;

use reqwest::multipart;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::validation::BookingDraft;

/// Booleans arrive either as JSON booleans or as 0/1 integers.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    })
}

/// A bookable home service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeService {
    pub id: i64,

    /// Price in Rupiah
    pub price: i64,

    /// Duration in hours
    #[serde(default)]
    pub duration: i64,

    pub name: String,

    pub slug: String,

    #[serde(default, deserialize_with = "flag")]
    pub is_popular: bool,

    /// Owning category; omitted when the service is nested inside its category
    #[serde(default)]
    pub category: Option<Box<Category>>,

    /// Storage path of the thumbnail image
    #[serde(default)]
    pub thumbnail: String,

    #[serde(default)]
    pub benefits: Vec<Benefit>,

    #[serde(default)]
    pub testimonials: Vec<Testimonial>,

    #[serde(default)]
    pub about: String,
}

/// One selling point listed on a service page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: i64,
    pub name: String,
}

/// A customer quote shown on a service page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Testimonial {
    pub id: i64,
    pub name: String,
    pub message: String,
    #[serde(default)]
    pub photo: String,
}

/// A service category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,

    pub name: String,

    pub slug: String,

    /// Storage path of the category icon
    #[serde(default)]
    pub photo: String,

    #[serde(default)]
    pub home_services_count: i64,

    #[serde(default)]
    pub home_services: Vec<HomeService>,

    #[serde(default)]
    pub popular_services: Vec<HomeService>,
}

/// A stored booking as returned by `/check-booking`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingDetails {
    pub id: i64,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub post_code: String,
    pub city: String,
    pub booking_trx_id: String,

    #[serde(deserialize_with = "flag")]
    pub is_paid: bool,

    pub sub_total: i64,
    pub total_tax_amount: i64,
    pub total_amount: i64,
    pub started_time: String,
    pub schedule_at: String,

    #[serde(default)]
    pub transaction_details: Vec<TransactionDetail>,

    /// Storage path of the uploaded proof of payment
    #[serde(default)]
    pub proof: Option<String>,
}

/// One booked service inside a [`BookingDetails`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub id: i64,
    /// Price charged at booking time
    pub price: i64,
    pub home_service_id: i64,
    pub home_service: HomeService,
}

/// What the server hands back after accepting a booking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub booking_trx_id: String,
    pub email: String,
}

/// An uploaded file held in memory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofFile {
    /// File name sent in the multipart part
    pub file_name: String,
    /// MIME type, guessed from the extension when not given
    pub content_type: Option<String>,
    /// Raw file contents
    pub bytes: Vec<u8>,
}

impl ProofFile {
    /// Create a proof from bytes, guessing the content type from `file_name`
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: guess_content_type(file_name).map(str::to_string),
            bytes,
        }
    }

    /// Read a proof file from disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "proof".to_string());
        Ok(Self::new(&file_name, bytes))
    }

    fn into_part(self) -> Result<multipart::Part> {
        let part = multipart::Part::bytes(self.bytes).file_name(self.file_name);
        match self.content_type {
            Some(mime) => Ok(part.mime_str(&mime)?),
            None => Ok(part),
        }
    }
}

fn guess_content_type(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Everything `/booking-transaction` needs: proof, contact details and services
#[derive(Debug, Clone)]
pub struct BookingSubmission {
    pub proof: ProofFile,
    /// Absent when no draft was saved; the scalar fields are then left out
    pub booking: Option<BookingDraft>,
    pub service_ids: Vec<i64>,
}

impl BookingSubmission {
    /// Build the multipart body; service ids are sent as `service_ids[i]`
    pub fn into_form(self) -> Result<multipart::Form> {
        let mut form = multipart::Form::new().part("proof", self.proof.into_part()?);

        if let Some(booking) = self.booking {
            form = form
                .text("name", booking.name)
                .text("email", booking.email)
                .text("phone", booking.phone)
                .text("address", booking.address)
                .text("city", booking.city)
                .text("post_code", booking.post_code)
                .text("started_time", booking.started_time)
                .text("schedule_at", booking.schedule_at);
        }

        for (index, id) in self.service_ids.iter().enumerate() {
            form = form.text(format!("service_ids[{}]", index), id.to_string());
        }

        Ok(form)
    }
}

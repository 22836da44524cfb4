use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The parts of Mercado Pago's `x-signature` header, which looks like `ts=1704908010,v1=618c8534...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub ts: String,
    pub v1: String,
}

/// Splits an `x-signature` header into its timestamp and signature. Unknown keys are ignored. Returns `None` if
/// either part is missing.
pub fn parse_signature_header(header: &str) -> Option<SignatureHeader> {
    let mut ts = None;
    let mut v1 = None;
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("ts", value)) => ts = Some(value.trim().to_string()),
            Some(("v1", value)) => v1 = Some(value.trim().to_lowercase()),
            _ => trace!("🔐️ Ignoring '{part}' in signature header"),
        }
    }
    Some(SignatureHeader { ts: ts?, v1: v1? })
}

/// Builds the string Mercado Pago signs. Parts that are not available are left out, and alphanumeric resource ids are
/// lower-cased, which is what the processor does on its side.
pub fn signature_manifest(data_id: Option<&str>, request_id: Option<&str>, ts: &str) -> String {
    let mut manifest = String::new();
    if let Some(id) = data_id {
        manifest.push_str(&format!("id:{};", id.to_lowercase()));
    }
    if let Some(request_id) = request_id {
        manifest.push_str(&format!("request-id:{request_id};"));
    }
    manifest.push_str(&format!("ts:{ts};"));
    manifest
}

/// HMAC-SHA256 of `data` under `secret`, as lower-case hex.
pub fn calculate_hmac(secret: &str, data: &[u8]) -> String {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(data);
    format!("{:x}", mac.finalize().into_bytes())
}

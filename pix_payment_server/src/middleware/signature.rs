//! Webhook signature middleware for Actix Web.
//!
//! Mercado Pago signs every webhook delivery with the secret shown in the application dashboard. The signature comes
//! in the `x-signature` header (`ts=<timestamp>,v1=<hex>`) and covers a manifest built from the resource id, the
//! `x-request-id` header and the timestamp (see [`signature_manifest`]).
//!
//! The resource id is taken from the `data.id` query parameter if present, and from the JSON body otherwise.
//!
//! Wrap the webhook route with this middleware to drop forged deliveries before they can trigger a reconciliation.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    error::{ErrorBadRequest, ErrorForbidden},
    web,
    Error,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use mercado_pago_tools::PaymentNotification;
use pix_common::Secret;

use crate::{
    data_objects::WebhookQuery,
    helpers::{calculate_hmac, parse_signature_header, signature_manifest},
};

pub const SIGNATURE_HEADER: &str = "x-signature";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct SignatureMiddlewareFactory {
    key: Secret<String>,
    // If false, then the middleware will not check the signature and always allow the call
    enabled: bool,
}

impl SignatureMiddlewareFactory {
    pub fn new(key: Secret<String>, enabled: bool) -> Self {
        SignatureMiddlewareFactory { key, enabled }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService { key: self.key.clone(), enabled: self.enabled, service: Rc::new(service) }))
    }
}

pub struct SignatureMiddlewareService<S> {
    key: Secret<String>,
    enabled: bool,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.key.reveal().clone();
        let enabled = self.enabled;
        Box::pin(async move {
            trace!("🔐️ Checking webhook signature");
            if !enabled {
                trace!("🔐️ Signature checks are disabled. Allowing request.");
                return service.call(req).await;
            }
            if secret.is_empty() {
                warn!("🔐️ No webhook secret is configured. Denying access.");
                return Err(ErrorForbidden("Webhook signatures cannot be verified."));
            }
            let header = req
                .headers()
                .get(SIGNATURE_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_signature_header)
                .ok_or_else(|| {
                    warn!("🔐️ No valid signature found in webhook request. Denying access.");
                    ErrorForbidden("No signature found.")
                })?;
            let request_id = req.headers().get(REQUEST_ID_HEADER).and_then(|v| v.to_str().ok()).map(String::from);
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {:?}", e);
                ErrorBadRequest("Failed to extract request data.")
            })?;
            let data_id = data_id_from_query(req.query_string()).or_else(|| {
                serde_json::from_slice::<PaymentNotification>(&data).ok().and_then(|n| n.payment_id().map(String::from))
            });
            let manifest = signature_manifest(data_id.as_deref(), request_id.as_deref(), &header.ts);
            let signature = calculate_hmac(&secret, manifest.as_bytes());
            if signature == header.v1 {
                trace!("🔐️ Signature check for webhook request ✅️");
                req.set_payload(bytes_to_payload(data));
                service.call(req).await
            } else {
                warn!("🔐️ Invalid signature found in webhook request. Denying access.");
                Err(ErrorForbidden("Invalid signature."))
            }
        })
    }
}

fn data_id_from_query(query: &str) -> Option<String> {
    let query = web::Query::<WebhookQuery>::from_query(query).ok()?;
    query.resource_id().map(String::from)
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}

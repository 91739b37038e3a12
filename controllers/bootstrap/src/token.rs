//! Cluster-scoped secret access: join token, CAPI auth token and CA
//! material.
//!
//! Token secrets are created on first use; the CA secret is owned by an
//! external certificate authority and is only ever read here.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Secret;
use kube::api::{Api, ObjectMeta, PostParams};
use kube::Client;
use tracing::info;

use crate::error::ControllerError;
use crate::reconcile_helpers::generate_join_token;

const SECRET_VALUE_KEY: &str = "value";
const CA_CERT_KEY: &str = "crt";
const CA_PRIVATE_KEY_KEY: &str = "key";

/// Name of the secret holding the cluster join token.
#[must_use]
pub fn join_token_secret_name(cluster_name: &str) -> String {
    format!("{cluster_name}-join-token")
}

/// Name of the secret holding the CAPI auth token.
#[must_use]
pub fn auth_token_secret_name(cluster_name: &str) -> String {
    format!("{cluster_name}-capi-auth-token")
}

/// Name of the secret holding the cluster CA material.
#[must_use]
pub fn ca_secret_name(cluster_name: &str) -> String {
    format!("{cluster_name}-ca")
}

/// Reads the cluster join token, generating and persisting one on first
/// use.
pub async fn get_or_create_join_token(
    client: &Client,
    namespace: &str,
    cluster_name: &str,
) -> Result<String, ControllerError> {
    get_or_create_token(client, namespace, &join_token_secret_name(cluster_name)).await
}

/// Reads the CAPI auth token, generating and persisting one on first use.
pub async fn get_or_create_auth_token(
    client: &Client,
    namespace: &str,
    cluster_name: &str,
) -> Result<String, ControllerError> {
    get_or_create_token(client, namespace, &auth_token_secret_name(cluster_name)).await
}

/// Reads the cluster CA certificate and private key, PEM encoded.
///
/// Returns `None` while the CA secret does not exist yet; creating it is
/// the certificate authority's job, not ours.
pub async fn get_cluster_ca(
    client: &Client,
    namespace: &str,
    cluster_name: &str,
) -> Result<Option<(String, String)>, ControllerError> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    let name = ca_secret_name(cluster_name);
    let Some(secret) = api.get_opt(&name).await? else {
        return Ok(None);
    };
    let cert = read_key(&secret, &name, CA_CERT_KEY)?;
    let key = read_key(&secret, &name, CA_PRIVATE_KEY_KEY)?;
    Ok(Some((cert, key)))
}

async fn get_or_create_token(
    client: &Client,
    namespace: &str,
    name: &str,
) -> Result<String, ControllerError> {
    let api: Api<Secret> = Api::namespaced(client.clone(), namespace);
    if let Some(secret) = api.get_opt(name).await? {
        return read_key(&secret, name, SECRET_VALUE_KEY);
    }

    let token = generate_join_token();
    let secret = Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        string_data: Some(BTreeMap::from([(
            SECRET_VALUE_KEY.to_string(),
            token.clone(),
        )])),
        ..Secret::default()
    };

    match api.create(&PostParams::default(), &secret).await {
        Ok(_) => {
            info!(secret = %name, "created token secret");
            Ok(token)
        }
        // Lost the creation race; use the winner's token.
        Err(kube::Error::Api(response)) if response.code == 409 => {
            let existing = api.get(name).await?;
            read_key(&existing, name, SECRET_VALUE_KEY)
        }
        Err(err) => Err(err.into()),
    }
}

fn read_key(secret: &Secret, name: &str, key: &str) -> Result<String, ControllerError> {
    let malformed = || ControllerError::MalformedSecret {
        secret: name.to_string(),
        key: key.to_string(),
    };
    let bytes = secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .ok_or_else(malformed)?;
    String::from_utf8(bytes.0.clone()).map_err(|_| malformed())
}

// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use log::{info, warn};

use crate::{
    api::{self, Api},
    error::{Error, Result},
    model::EmailType,
};

/// Ask the service which sign-in method applies to `email`.
///
/// Anything the service says that we can't make sense of classifies the
/// email as [`EmailType::Unknown`]. Only transport failures are errors.
pub(crate) async fn classify(api: &Api, email: &str) -> Result<EmailType> {
    let req = api::CheckEligible {
        email: email.to_owned(),
    };

    match api.execute(req, None).await {
        Ok(eligibility) => Ok(EmailType::from_action_key(&eligibility.action_key)
            .unwrap_or_else(|| {
                info!(
                    "The service answered with an action we don't know for {}: {}",
                    email, eligibility.action_key
                );
                EmailType::Unknown
            })),
        Err(Error::Api(e)) => {
            warn!("Could not classify {}: {}", email, e);
            Ok(EmailType::Unknown)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::{
        api::tests::api,
        transport::stub::{Method, Reply, Stub},
    };

    const PATH: &str = "/v2/users/check_elegible";

    async fn classify_with(reply: Reply, email: &str) -> (Result<EmailType>, Arc<Stub>) {
        let stub = Arc::new(Stub::new());
        stub.on(Method::Post, PATH, reply);
        (classify(&api(&stub), email).await, stub)
    }

    #[tokio::test]
    async fn google_account_uses_oauth() -> Result<()> {
        let (result, stub) = classify_with(
            Reply::Json(json!({"action_key": "user-google"})),
            "user@gmail.com",
        )
        .await;
        assert_eq!(result?, EmailType::OAuth);

        let calls = stub.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].json, Some(json!({"email": "user@gmail.com"})));
        Ok(())
    }

    #[tokio::test]
    async fn other_action_keys() -> Result<()> {
        for (key, expected) in [
            ("user-non-google", EmailType::Email),
            ("user-eligible", EmailType::Signup),
            ("something-new", EmailType::Unknown),
        ] {
            let (result, _) =
                classify_with(Reply::Json(json!({ "action_key": key })), "x@y.com").await;
            assert_eq!(result?, expected);
        }
        Ok(())
    }

    #[tokio::test]
    async fn errors_classify_as_unknown() -> Result<()> {
        let (result, _) =
            classify_with(Reply::Json(json!({"errors": ["bad"]})), "x@y.com").await;
        assert_eq!(result?, EmailType::Unknown);
        Ok(())
    }

    #[tokio::test]
    async fn unparseable_responses_classify_as_unknown() -> Result<()> {
        let (result, _) = classify_with(Reply::NotJson, "x@y.com").await;
        assert_eq!(result?, EmailType::Unknown);

        let (result, _) = classify_with(Reply::Json(json!({"action": 1})), "x@y.com").await;
        assert_eq!(result?, EmailType::Unknown);
        Ok(())
    }

    #[tokio::test]
    async fn network_failure_propagates() {
        let (result, stub) = classify_with(Reply::Unreachable, "x@y.com").await;
        assert!(matches!(result, Err(Error::Network(_))));
        assert_eq!(stub.calls().len(), 1);
    }
}

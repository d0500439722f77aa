//! Per-topic authorization against the permission engine and domain cache.
//!
//! Every requested topic is evaluated independently and concurrently with
//! settle-all semantics: one rejected topic never cancels or alters the
//! outcome of another. Only an unknown topic key aborts the whole request.

use crate::stream::error::{AccessError, StreamError};
use crate::stream::session::Principal;
use crate::stream::topic::{parse_topic, ProjectRef, ScopeMetadata, Topic};
use futures::future::join_all;
use std::future::Future;

/// Permission-evaluation engine collaborator.
///
/// Checks may fail with a transport or service error; the caller surfaces
/// that as a per-topic rejection carrying the reported status.
pub trait AccessReview: Send + Sync {
    fn can_list_shoots(
        &self,
        principal: &Principal,
        namespace: &str,
    ) -> impl Future<Output = Result<bool, AccessError>> + Send;

    fn can_get_shoot(
        &self,
        principal: &Principal,
        namespace: &str,
        name: &str,
    ) -> impl Future<Output = Result<bool, AccessError>> + Send;

    fn is_admin(&self, principal: &Principal)
        -> impl Future<Output = Result<bool, AccessError>> + Send;
}

/// In-memory domain-object cache collaborator.
pub trait ProjectCache: Send + Sync {
    /// Reverse lookup of the project owning a namespace.
    fn project_by_namespace(&self, namespace: &str) -> Option<ProjectRef>;
    /// Projects visible to the principal.
    fn visible_projects(&self, principal: &Principal) -> Vec<ProjectRef>;
}

/// Result of authorizing one requested topic.
#[derive(Debug, Clone)]
pub enum AuthorizationOutcome {
    /// Admitted; the topic now carries its resolved scope metadata.
    Authorized(Topic),
    /// Denied; never fatal to the stream. The parsed topic is preserved for
    /// diagnostics but carries no scope metadata.
    Rejected {
        topic: Topic,
        status: u16,
        message: String,
    },
}

impl AuthorizationOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// Status and message of a rejection, if this outcome is one.
    pub fn rejection(&self) -> Option<(u16, &str)> {
        match self {
            Self::Rejected {
                status, message, ..
            } => Some((*status, message.as_str())),
            Self::Authorized(_) => None,
        }
    }
}

/// Authorize all requested topics concurrently.
///
/// All branches run to completion before outcomes are collected; an unknown
/// topic key then surfaces as a request-level [`StreamError::InvalidTopic`].
pub async fn authorize_topics<A, P>(
    principal: &Principal,
    raw_topics: &[String],
    access: &A,
    cache: &P,
) -> Result<Vec<AuthorizationOutcome>, StreamError>
where
    A: AccessReview,
    P: ProjectCache,
{
    let settled = join_all(
        raw_topics
            .iter()
            .map(|raw| authorize_topic(principal, raw, access, cache)),
    )
    .await;
    settled.into_iter().collect()
}

/// Authorize a single raw topic string.
pub async fn authorize_topic<A, P>(
    principal: &Principal,
    raw: &str,
    access: &A,
    cache: &P,
) -> Result<AuthorizationOutcome, StreamError>
where
    A: AccessReview,
    P: ProjectCache,
{
    let mut topic = parse_topic(raw);
    let decision = match topic.key.as_str() {
        "shoots" => shoots_scope(principal, &topic, access, cache).await,
        _ => {
            return Err(StreamError::InvalidTopic {
                topic: raw.to_string(),
            })
        }
    };
    match decision {
        Ok((true, scope)) => {
            topic.metadata = Some(scope);
            Ok(AuthorizationOutcome::Authorized(topic))
        }
        Ok((false, _)) => Ok(AuthorizationOutcome::Rejected {
            topic,
            status: 403,
            message: format!("no authorization to subscribe topic {raw:?}"),
        }),
        Err(err) => Ok(AuthorizationOutcome::Rejected {
            topic,
            status: err.status,
            message: err.message,
        }),
    }
}

/// Keyed admission algorithm for the `shoots` category.
///
/// Returns the allow/deny decision together with the scope the session would
/// adopt; the scope is only attached to the topic when the decision allows.
async fn shoots_scope<A, P>(
    principal: &Principal,
    topic: &Topic,
    access: &A,
    cache: &P,
) -> Result<(bool, ScopeMetadata), AccessError>
where
    A: AccessReview,
    P: ProjectCache,
{
    if !topic.args.is_empty() {
        let namespace = topic.args[0].as_str();
        let name = topic.args.get(1).filter(|n| !n.is_empty());
        let project_name = cache.project_by_namespace(namespace).map(|p| p.name);
        let mut scope = ScopeMetadata {
            namespace: Some(namespace.to_string()),
            project_name,
            ..Default::default()
        };
        return match name {
            None => {
                let allowed = access.can_list_shoots(principal, namespace).await?;
                Ok((allowed, scope))
            }
            Some(name) => {
                let allowed = access.can_get_shoot(principal, namespace, name).await?;
                scope.name = Some(name.to_string());
                Ok((allowed, scope))
            }
        };
    }

    if access.is_admin(principal).await? {
        return Ok((
            true,
            ScopeMetadata {
                all_namespaces: true,
                ..Default::default()
            },
        ));
    }

    // Enumerate every namespace the principal's visible projects map to and
    // require list permission on each. The project/namespace pairing stays an
    // explicit struct so filters can match by project name directly.
    let projects = cache.visible_projects(principal);
    let checks = join_all(
        projects
            .iter()
            .map(|project| access.can_list_shoots(principal, &project.namespace)),
    )
    .await;
    let mut allowed = true;
    for check in checks {
        allowed &= check?;
    }
    Ok((
        allowed,
        ScopeMetadata {
            projects,
            ..Default::default()
        },
    ))
}

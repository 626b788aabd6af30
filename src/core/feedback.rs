//! Feedback recorder.
//!
//! A commuter rates a driver, a conductor, or both, with a score between 0 and 5 and a
//! comment. Validation happens before any database access; reference checks and the insert
//! share one atomic unit.

use crate::{
    entities::{Commuter, Conductor, Driver, Feedback, feedback},
    errors::{Error, Result},
    gateway::Gateway,
};
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Highest accepted rating.
pub const MAX_RATING: f64 = 5.0;

/// A feedback submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewFeedback {
    /// Commuter giving the feedback
    pub commuter_id: String,
    /// Driver being rated
    pub driver_id: Option<String>,
    /// Conductor being rated
    pub conductor_id: Option<String>,
    /// Score from 0.0 to 5.0
    pub rating: f64,
    /// Free text, stored trimmed
    pub comment: String,
}

impl NewFeedback {
    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidFeedback {
            reason: reason.to_string(),
        };
        if self.driver_id.is_none() && self.conductor_id.is_none() {
            return Err(invalid("a driver or a conductor must be rated"));
        }
        if !self.rating.is_finite() || !(0.0..=MAX_RATING).contains(&self.rating) {
            return Err(Error::InvalidFeedback {
                reason: format!("rating {} is outside 0.0 to {MAX_RATING}", self.rating),
            });
        }
        if self.comment.trim().is_empty() {
            return Err(invalid("comment cannot be empty"));
        }
        Ok(())
    }
}

/// Records feedback and returns its id.
///
/// # Arguments
/// * `gateway` - Connection to record through
/// * `new` - Commuter giving the feedback, the driver and/or conductor it is about, rating
///   and comment
///
/// # Errors
/// * `Error::InvalidFeedback` - no target, rating out of range, or blank comment
/// * `Error::ReferenceNotFound` - the commuter, driver or conductor does not exist
#[instrument(skip(gateway, new), fields(commuter_id = %new.commuter_id, rating = new.rating))]
pub async fn record_feedback(gateway: &Gateway, new: NewFeedback) -> Result<i64> {
    new.validate()?;
    gateway
        .atomic(move |txn| Box::pin(async move { insert_feedback(txn, new).await }))
        .await
}

async fn insert_feedback<C: ConnectionTrait>(db: &C, new: NewFeedback) -> Result<i64> {
    Commuter::find_by_id(new.commuter_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("commuter", &new.commuter_id))?;
    if let Some(driver_id) = &new.driver_id {
        Driver::find_by_id(driver_id.clone())
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("driver", driver_id))?;
    }
    if let Some(conductor_id) = &new.conductor_id {
        Conductor::find_by_id(conductor_id.clone())
            .one(db)
            .await?
            .ok_or_else(|| Error::not_found("conductor", conductor_id))?;
    }

    let saved = feedback::ActiveModel {
        commuter_id: Set(Some(new.commuter_id)),
        driver_id: Set(new.driver_id),
        conductor_id: Set(new.conductor_id),
        rating: Set(Some(new.rating)),
        comment: Set(Some(new.comment.trim().to_string())),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Recorded feedback {}", saved.feedback_id);
    Ok(saved.feedback_id)
}

/// Feedback a commuter has given, newest first.
pub async fn feedback_by_commuter(
    gateway: &Gateway,
    commuter_id: &str,
) -> Result<Vec<feedback::Model>> {
    list_feedback(gateway, feedback::Column::CommuterId, commuter_id, true).await
}

/// Feedback about a driver, oldest first.
pub async fn feedback_for_driver(
    gateway: &Gateway,
    driver_id: &str,
) -> Result<Vec<feedback::Model>> {
    list_feedback(gateway, feedback::Column::DriverId, driver_id, false).await
}

/// Feedback about a conductor, oldest first.
pub async fn feedback_for_conductor(
    gateway: &Gateway,
    conductor_id: &str,
) -> Result<Vec<feedback::Model>> {
    list_feedback(gateway, feedback::Column::ConductorId, conductor_id, false).await
}

async fn list_feedback(
    gateway: &Gateway,
    column: feedback::Column,
    id: &str,
    newest_first: bool,
) -> Result<Vec<feedback::Model>> {
    let id = id.to_string();
    gateway
        .atomic(move |txn| {
            Box::pin(async move {
                let query = Feedback::find().filter(column.eq(id));
                let query = if newest_first {
                    query.order_by_desc(feedback::Column::FeedbackId)
                } else {
                    query.order_by_asc(feedback::Column::FeedbackId)
                };
                query.all(txn).await.map_err(Into::into)
            })
        })
        .await
}

//! Authorization rules.
//!
//! Every rule is a pure function of the actor, the resolved target and, where
//! needed, counts read from the store. Rules never touch the store themselves and
//! are evaluated top to bottom, stopping at the first failure. Ownership
//! mismatches are reported as `NotFound` so that other users' rows stay invisible.

use crate::error::{
    AppError, COMPANY_CANNOT_RESPOND, DELETE_YOUR_JOBS, DELETE_YOUR_RESPONSES, JOB_NOT_ACTIVE,
    JOB_NOT_FOUND, NOT_YOUR_JOB, NOT_YOUR_RESPONSE, RESPONSE_NOT_FOUND, SEEKER_CANNOT_POST_JOBS,
    TARGET_JOB_NOT_FOUND, USER_NOT_FOUND,
};
use crate::models::{Job, OwnedCounts, Response, User};

/// Actor
///
/// The authenticated user making a request, tagged by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Seeker(i64),
    Company(i64),
}

impl Actor {
    pub fn from_user(user: &User) -> Self {
        if user.is_company {
            Actor::Company(user.id)
        } else {
            Actor::Seeker(user.id)
        }
    }

    pub fn id(&self) -> i64 {
        match *self {
            Actor::Seeker(id) | Actor::Company(id) => id,
        }
    }

    pub fn is_company(&self) -> bool {
        matches!(self, Actor::Company(_))
    }
}

/// Only companies post jobs.
pub fn create_job(actor: &Actor) -> Result<(), AppError> {
    match actor {
        Actor::Company(_) => Ok(()),
        Actor::Seeker(_) => Err(AppError::forbidden(SEEKER_CANNOT_POST_JOBS)),
    }
}

/// A company may list its own jobs; any other user id reads as missing.
pub fn list_owned_jobs(actor: &Actor, owner: Option<&User>) -> Result<(), AppError> {
    let owner = owner.ok_or_else(|| AppError::not_found(USER_NOT_FOUND))?;
    if owner.id != actor.id() {
        return Err(AppError::not_found(USER_NOT_FOUND));
    }
    match actor {
        Actor::Company(_) => Ok(()),
        Actor::Seeker(_) => Err(AppError::forbidden(SEEKER_CANNOT_POST_JOBS)),
    }
}

/// Update/delete of a job: it must exist and belong to the actor.
pub fn modify_job<'a>(actor: &Actor, job: Option<&'a Job>) -> Result<&'a Job, AppError> {
    let job = job.ok_or_else(|| AppError::not_found(JOB_NOT_FOUND))?;
    if job.user_id != actor.id() {
        return Err(AppError::not_found(NOT_YOUR_JOB));
    }
    Ok(job)
}

/// Responding to a job: seekers only, and only to an existing active job.
pub fn create_response(actor: &Actor, job: Option<&Job>) -> Result<(), AppError> {
    if actor.is_company() {
        return Err(AppError::forbidden(COMPANY_CANNOT_RESPOND));
    }
    let job = job.ok_or_else(|| AppError::not_found(TARGET_JOB_NOT_FOUND))?;
    if !job.is_active {
        return Err(AppError::forbidden(JOB_NOT_ACTIVE));
    }
    Ok(())
}

/// Update/delete of a response: it must exist and belong to the actor.
pub fn modify_response<'a>(
    actor: &Actor,
    response: Option<&'a Response>,
) -> Result<&'a Response, AppError> {
    let response = response.ok_or_else(|| AppError::not_found(RESPONSE_NOT_FOUND))?;
    if response.user_id != actor.id() {
        return Err(AppError::not_found(NOT_YOUR_RESPONSE));
    }
    Ok(response)
}

/// Profile updates are limited to the actor's own account.
pub fn update_user<'a>(actor: &Actor, target: Option<&'a User>) -> Result<&'a User, AppError> {
    match target {
        Some(user) if user.id == actor.id() => Ok(user),
        _ => Err(AppError::not_found(USER_NOT_FOUND)),
    }
}

/// Switching role requires the user to own nothing of the kind the old role produced.
pub fn switch_role(current: &User, requested: Option<bool>, owned: OwnedCounts) -> Result<(), AppError> {
    match (current.is_company, requested) {
        (true, Some(false)) if owned.jobs > 0 => Err(AppError::forbidden(DELETE_YOUR_JOBS)),
        (false, Some(true)) if owned.responses > 0 => {
            Err(AppError::forbidden(DELETE_YOUR_RESPONSES))
        }
        _ => Ok(()),
    }
}

/// Whether `requested` actually changes the user's role.
pub fn is_role_switch(current: &User, requested: Option<bool>) -> bool {
    requested.is_some_and(|flag| flag != current.is_company)
}

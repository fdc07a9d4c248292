//! Seed the `users` table with sample records.
//!
//! Records go through the same validation and repository code as the HTTP
//! API. Emails are deterministic (`<first>.<last>.<n>@example.com`), so
//! re-running the command skips rows it already inserted.

use rollcall_api::db::UserRepository;
use rollcall_api::models::CreateUserRequest;

use super::{CommandError, connect};

const FIRST_NAMES: &[&str] = &["Ada", "Grace", "Alan", "Edsger", "Barbara", "Ken", "Radia"];
const LAST_NAMES: &[&str] = &["Smith", "Hopper", "Turing", "Dijkstra", "Liskov", "Thompson"];

/// Outcome of a seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: u32,
    pub skipped: u32,
}

/// Build the `n`-th sample user. Every third user has no phone.
#[must_use]
pub fn sample_user(n: u32) -> CreateUserRequest {
    let index = n as usize;
    let first = FIRST_NAMES.get(index % FIRST_NAMES.len()).copied().unwrap_or("Sample");
    let last = LAST_NAMES.get(index % LAST_NAMES.len()).copied().unwrap_or("User");

    CreateUserRequest {
        name: format!("{first} {last}"),
        email: format!(
            "{}.{}.{n}@example.com",
            first.to_ascii_lowercase(),
            last.to_ascii_lowercase()
        ),
        phone: (n % 3 != 0).then(|| format!("+1-555-{:04}", n % 10_000)),
    }
}

/// Insert `count` sample users, skipping emails that already exist.
///
/// # Errors
///
/// Returns `CommandError` if configuration is missing, the database is
/// unreachable, or an insert fails for a reason other than a duplicate.
pub async fn run(count: u32) -> Result<SeedSummary, CommandError> {
    let pool = connect().await?;
    let users = UserRepository::new(&pool);
    let mut summary = SeedSummary::default();

    for n in 1..=count {
        let new_user = sample_user(n).validate()?;

        if users.email_exists(&new_user.email, None).await? {
            tracing::debug!(email = %new_user.email, "skipping existing user");
            summary.skipped += 1;
            continue;
        }

        let user = users.create(&new_user).await?;
        tracing::debug!(user_id = %user.id, "seeded user");
        summary.created += 1;
    }

    pool.close().await;
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_users_validate() {
        for n in 1..=100 {
            assert!(sample_user(n).validate().is_ok(), "sample {n} is invalid");
        }
    }

    #[test]
    fn test_sample_emails_are_unique() {
        let emails: std::collections::HashSet<_> =
            (1..=200).map(|n| sample_user(n).email).collect();
        assert_eq!(emails.len(), 200);
    }

    #[test]
    fn test_every_third_user_has_no_phone() {
        assert!(sample_user(3).phone.is_none());
        assert_eq!(sample_user(4).phone.as_deref(), Some("+1-555-0004"));
    }
}

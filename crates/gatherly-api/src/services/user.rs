// Profile DTO assembly

use gatherly_core::{CurrentUser, PublicProfile, UserCounts};
use gatherly_storage::models::{UserCountsRow, UserRow};

fn counts(row: UserCountsRow) -> UserCounts {
    UserCounts {
        hosted_events: row.hosted_events,
        attending: row.attending,
        followers: row.followers,
        following: row.following,
    }
}

pub fn current_user(user: UserRow, count_row: UserCountsRow) -> CurrentUser {
    CurrentUser {
        id: user.id,
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        avatar: user.avatar,
        bio: user.bio,
        phone: user.phone,
        location: user.location,
        website: user.website,
        verified: user.verified,
        created_at: user.created_at,
        counts: counts(count_row),
    }
}

/// Projection safe to show to anyone: no email, phone or token state
pub fn public_profile(user: UserRow, count_row: UserCountsRow) -> PublicProfile {
    PublicProfile {
        id: user.id,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        avatar: user.avatar,
        bio: user.bio,
        location: user.location,
        website: user.website,
        verified: user.verified,
        created_at: user.created_at,
        counts: counts(count_row),
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Banner targeting rules.

use crate::models::{BannerType, NotificationBanner, Role};

pub const MAX_BANNERS: usize = 10;

fn within_window(banner: &NotificationBanner, now: &str) -> bool {
    let started = banner.start_date.as_deref().is_none_or(|s| s <= now);
    let not_ended = banner.end_date.as_deref().is_none_or(|e| e >= now);
    started && not_ended
}

/// Banners for signed-out visitors.
pub fn visible_to_public(banner: &NotificationBanner, now: &str) -> bool {
    banner.is_active
        && banner.banner_type == BannerType::Public
        && banner.target_user_id.is_none()
        && within_window(banner, now)
}

/// Banners for a signed-in user. Banners addressed to the user ignore the
/// date window.
pub fn visible_to_user(banner: &NotificationBanner, user_id: &str, role: Role, now: &str) -> bool {
    if !banner.is_active {
        return false;
    }
    match banner.target_user_id.as_deref() {
        Some(target) => target == user_id,
        None => banner.banner_type == BannerType::for_role(role) && within_window(banner, now),
    }
}

/// Highest priority first, newest first among equals, capped at
/// [`MAX_BANNERS`].
pub fn select(mut banners: Vec<NotificationBanner>) -> Vec<NotificationBanner> {
    banners.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    banners.truncate(MAX_BANNERS);
    banners
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: &str = "2026-03-01T12:00:00Z";

    fn banner(banner_type: BannerType) -> NotificationBanner {
        NotificationBanner {
            id: "b1".into(),
            title: "Hello".into(),
            message: "World".into(),
            banner_type,
            target_user_id: None,
            is_active: true,
            priority: 0,
            bg_color: None,
            text_color: None,
            icon: None,
            link_url: None,
            link_text: None,
            start_date: None,
            end_date: None,
            created_by: "admin".into(),
            created_at: "2026-01-01T00:00:00Z".into(),
            updated_at: "2026-01-01T00:00:00Z".into(),
        }
    }

    #[test]
    fn test_public_window() {
        let mut b = banner(BannerType::Public);
        assert!(visible_to_public(&b, NOW));

        b.start_date = Some("2026-04-01T00:00:00Z".into());
        assert!(!visible_to_public(&b, NOW));

        b.start_date = Some("2026-02-01T00:00:00Z".into());
        b.end_date = Some("2026-02-28T00:00:00Z".into());
        assert!(!visible_to_public(&b, NOW));

        b.end_date = None;
        b.is_active = false;
        assert!(!visible_to_public(&b, NOW));
    }

    #[test]
    fn test_role_banners_not_public() {
        assert!(!visible_to_public(&banner(BannerType::Employer), NOW));
        assert!(visible_to_user(
            &banner(BannerType::Employer),
            "u1",
            Role::Employer,
            NOW
        ));
        assert!(!visible_to_user(
            &banner(BannerType::Employer),
            "u1",
            Role::JobSeeker,
            NOW
        ));
    }

    #[test]
    fn test_targeted_banner_ignores_window() {
        let mut b = banner(BannerType::JobSeeker);
        b.target_user_id = Some("u1".into());
        b.end_date = Some("2025-01-01T00:00:00Z".into());
        assert!(visible_to_user(&b, "u1", Role::JobSeeker, NOW));
        assert!(!visible_to_user(&b, "u2", Role::JobSeeker, NOW));
        assert!(!visible_to_public(&b, NOW));
    }

    #[test]
    fn test_select_orders_and_caps() {
        let banners: Vec<_> = (0..15)
            .map(|i| {
                let mut b = banner(BannerType::Public);
                b.id = format!("b{}", i);
                b.priority = i % 3;
                b
            })
            .collect();
        let picked = select(banners);
        assert_eq!(picked.len(), MAX_BANNERS);
        assert!(picked.iter().take(5).all(|b| b.priority == 2));
    }
}

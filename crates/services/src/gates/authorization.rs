//! Ownership and role checks for post mutations.

use domains::{AppError, Post, Result, User};

const DENIED: &str = "You do not have valid permissions.";

/// Only the owner may change a post's text.
pub fn can_edit(requester: &User, post: &Post) -> bool {
    requester.id == post.user_id
}

/// The owner or any admin may delete a post.
pub fn can_delete(requester: &User, post: &Post) -> bool {
    requester.id == post.user_id || requester.is_admin()
}

pub fn authorize_edit(requester: &User, post: &Post) -> Result<()> {
    if can_edit(requester, post) {
        Ok(())
    } else {
        Err(AppError::Forbidden(DENIED.into()))
    }
}

pub fn authorize_delete(requester: &User, post: &Post) -> Result<()> {
    if can_delete(requester, post) {
        Ok(())
    } else {
        Err(AppError::Forbidden(DENIED.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use domains::{NewPost, PostId, Role, UserId};

    fn user(id: i64, role: Role) -> User {
        User {
            id: UserId(id),
            username: format!("user{id}"),
            role,
            last_action_at: None,
        }
    }

    fn post_owned_by(owner: i64) -> Post {
        NewPost {
            title: "title".into(),
            tag: "general".into(),
            text: "text".into(),
            author: "owner".into(),
            user_id: UserId(owner),
            created_at: Utc::now(),
        }
        .into_post(PostId(9))
    }

    #[test]
    fn edit_is_owner_only_regardless_of_role() {
        let post = post_owned_by(1);
        assert!(can_edit(&user(1, Role::Member), &post));
        assert!(!can_edit(&user(2, Role::Member), &post));
        assert!(!can_edit(&user(2, Role::Admin), &post));
    }

    #[test]
    fn delete_matrix() {
        let post = post_owned_by(1);
        let cases = [
            (1, Role::Member, true),
            (1, Role::Admin, true),
            (2, Role::Admin, true),
            (2, Role::Member, false),
        ];
        for (id, role, expected) in cases {
            assert_eq!(can_delete(&user(id, role), &post), expected, "{id} {role:?}");
        }
    }

    #[test]
    fn admins_still_cannot_edit_other_posts() {
        let admin = user(2, Role::Admin);
        let post = post_owned_by(1);
        assert_eq!(
            authorize_edit(&admin, &post),
            Err(AppError::Forbidden(DENIED.into()))
        );
        assert_eq!(authorize_delete(&admin, &post), Ok(()));
    }
}

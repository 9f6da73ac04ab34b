use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use tokio_postgres::Row;

#[derive(Clone)]
pub struct ProfileStatements {
  profile_by_user: VersionedStatement,
  update_profile: VersionedStatement,

  is_following: VersionedStatement,
  follow: VersionedStatement,
  unfollow: VersionedStatement,
}

lazy_static! {
  static ref PROFILE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "profiles",
      columns: vec![
        primary("id"),
        column("user_id"),
        column("bio"),
        column("location"),
        column("website"),
        generated("created_at"),
      ],
    }
  };
}

fn profile_details_from_row(row: &Row) -> ProfileDetails {
  ProfileDetails {
    profile: Profile {
      id: row.get(0),
      user_id: row.get(1),
      bio: row.get(2),
      location: row.get(3),
      website: row.get(4),
      created_at: row.get(5),
    },
    username: row.get(6),
    followers_count: row.get(7),
    following_count: row.get(8),
  }
}

static PROFILE_IDS: &'static str = r#"
  (SELECT id FROM profiles WHERE user_id = $1),
  (SELECT id FROM profiles WHERE user_id = $2)
"#;

impl ProfileStatements {
  pub fn new(cl: &SharedClient) -> ProfileStatements {
    let profile_by_user = VersionedStatement::new(cl.clone(),
        &format!(r#"SELECT {}, u.username,
          (SELECT COUNT(*) FROM profile_following WHERE to_profile_id = p.id) AS Followers,
          (SELECT COUNT(*) FROM profile_following WHERE from_profile_id = p.id) AS Following
        FROM profiles p INNER JOIN users u ON p.user_id = u.id
        WHERE p.user_id = $1"#, PROFILE_COLUMNS.get_columns(Some("p"))));

    let update_profile = VersionedStatement::new(cl.clone(),
        &PROFILE_COLUMNS.build_update_where("user_id"));

    let is_following = VersionedStatement::new(cl.clone(),
        &format!(r#"SELECT EXISTS(
          SELECT 1 FROM profile_following
          WHERE (from_profile_id, to_profile_id) = ({})
        )"#, PROFILE_IDS));

    // The CHECK constraint on profile_following rejects self-edges.
    let follow = VersionedStatement::new(cl.clone(),
        &format!(r#"INSERT INTO profile_following(from_profile_id, to_profile_id)
          VALUES({})
          ON CONFLICT DO NOTHING"#, PROFILE_IDS));
    let unfollow = VersionedStatement::new(cl.clone(),
        &format!(r#"DELETE FROM profile_following
          WHERE (from_profile_id, to_profile_id) = ({})"#, PROFILE_IDS));

    ProfileStatements {
      profile_by_user,
      update_profile,
      is_following,
      follow,
      unfollow,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.profile_by_user.prepare().await?;
    self.update_profile.prepare().await?;
    self.is_following.prepare().await?;
    self.follow.prepare().await?;
    self.unfollow.prepare().await?;
    Ok(())
  }

  pub async fn get_details(&self, user_id: i32) -> Result<Option<ProfileDetails>> {
    let row = self.profile_by_user.query_opt(&[&user_id]).await?;
    Ok(row.as_ref().map(profile_details_from_row))
  }

  pub async fn update(&self, user_id: i32, changes: &ProfileChanges) -> Result<u64> {
    self.update_profile.execute(&[
      &changes.bio, &changes.location, &changes.website, &user_id,
    ]).await
  }

  pub async fn is_following(&self, follower_id: i32, target_id: i32) -> Result<bool> {
    let row = self.is_following.query_one(&[&follower_id, &target_id]).await?;
    Ok(row.get(0))
  }

  pub async fn follow(&self, follower_id: i32, target_id: i32) -> Result<u64> {
    self.follow.execute(&[&follower_id, &target_id]).await
  }

  pub async fn unfollow(&self, follower_id: i32, target_id: i32) -> Result<u64> {
    self.unfollow.execute(&[&follower_id, &target_id]).await
  }
}

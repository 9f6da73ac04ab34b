use crate::error::*;

use crate::db::*;
use crate::db::util::*;

#[derive(Clone)]
pub struct LikeStatements {
  like_post: VersionedStatement,
  unlike_post: VersionedStatement,
}

lazy_static! {
  static ref LIKE_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "likes",
      columns: vec![
        primary("id"),
        column("user_id"),
        column("post_id"),
        generated("created_at"),
      ],
    }
  };
}

impl LikeStatements {
  pub fn new(cl: &SharedClient) -> LikeStatements {
    // (user_id, post_id) is unique, a concurrent duplicate becomes a no-op.
    let like_post = VersionedStatement::new(cl.clone(),
        &LIKE_COLUMNS.build_insert_or_ignore("(user_id, post_id)"));
    let unlike_post = VersionedStatement::new(cl.clone(),
        "DELETE FROM likes WHERE user_id = $1 AND post_id = $2");

    LikeStatements {
      like_post,
      unlike_post,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.like_post.prepare().await?;
    self.unlike_post.prepare().await?;
    Ok(())
  }

  pub async fn like(&self, user_id: i32, post_id: i32) -> Result<u64> {
    Ok(self.like_post.query(&[&user_id, &post_id]).await?.len() as u64)
  }

  pub async fn unlike(&self, user_id: i32, post_id: i32) -> Result<u64> {
    self.unlike_post.execute(&[&user_id, &post_id]).await
  }
}

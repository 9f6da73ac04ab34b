use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use tokio_postgres::Row;

#[derive(Clone)]
pub struct PostStatements {
  // get one post
  post_by_id: VersionedStatement,
  owned_post: VersionedStatement,
  summary_by_id: VersionedStatement,

  // get multiple posts
  get_posts: VersionedStatement,
  posts_by_author: VersionedStatement,

  store_post: VersionedStatement,
  update_post: VersionedStatement,
  delete_post: VersionedStatement,
}

lazy_static! {
  static ref POST_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "posts",
      columns: vec![
        primary("id"),
        column("author_id"),
        column("title"),
        column("content"),
        generated("created_at"),
        generated("updated_at"),
      ],
    }
  };

  static ref POST_SUMMARY_SELECT: String = format!(r#"
SELECT {}, u.username,
  (SELECT COUNT(*) FROM likes WHERE post_id = p.id) AS LikeCount,
  (SELECT COUNT(*) FROM comments WHERE post_id = p.id) AS CommentCount,
  EXISTS(SELECT 1 FROM likes WHERE post_id = p.id AND user_id = $1) AS Liked
FROM posts p INNER JOIN users u ON p.author_id = u.id
"#, POST_COLUMNS.get_columns(Some("p")));
}

static NEWEST_FIRST: &'static str = "ORDER BY p.created_at DESC, p.id DESC";

fn post_from_row(row: &Row) -> Post {
  Post {
    id: row.get(0),
    author_id: row.get(1),
    title: row.get(2),
    content: row.get(3),
    created_at: row.get(4),
    updated_at: row.get(5),
  }
}

fn post_summary_from_row(row: &Row) -> PostSummary {
  PostSummary {
    post: post_from_row(row),
    author: row.get(6),
    like_count: row.get(7),
    comment_count: row.get(8),
    liked: row.get(9),
  }
}

impl PostStatements {
  pub fn new(cl: &SharedClient) -> PostStatements {
    let select = POST_COLUMNS.build_select_query();
    let post_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select));
    let owned_post = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1 AND author_id = $2"#, select));
    let summary_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE p.id = $2"#, *POST_SUMMARY_SELECT));

    let get_posts = VersionedStatement::new(cl.clone(),
        &format!(r#"{} {}"#, *POST_SUMMARY_SELECT, NEWEST_FIRST));
    let posts_by_author = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE p.author_id = $2 {}"#, *POST_SUMMARY_SELECT, NEWEST_FIRST));

    let store_post = VersionedStatement::new(cl.clone(),
        &POST_COLUMNS.build_insert_query());
    let update_post = VersionedStatement::new(cl.clone(),
        r#"UPDATE posts SET title = $3, content = $4, updated_at = (now() AT TIME ZONE 'utc')
        WHERE id = $1 AND author_id = $2"#);
    let delete_post = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM posts WHERE id = $1 AND author_id = $2"#);

    PostStatements {
      post_by_id,
      owned_post,
      summary_by_id,
      get_posts,
      posts_by_author,
      store_post,
      update_post,
      delete_post,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.post_by_id.prepare().await?;
    self.owned_post.prepare().await?;
    self.summary_by_id.prepare().await?;
    self.get_posts.prepare().await?;
    self.posts_by_author.prepare().await?;
    self.store_post.prepare().await?;
    self.update_post.prepare().await?;
    self.delete_post.prepare().await?;
    Ok(())
  }

  pub async fn get_by_id(&self, post_id: i32) -> Result<Option<Post>> {
    let row = self.post_by_id.query_opt(&[&post_id]).await?;
    Ok(row.as_ref().map(post_from_row))
  }

  pub async fn get_owned(&self, post_id: i32, author_id: i32) -> Result<Option<Post>> {
    let row = self.owned_post.query_opt(&[&post_id, &author_id]).await?;
    Ok(row.as_ref().map(post_from_row))
  }

  pub async fn get_summary(&self, viewer: Option<i32>, post_id: i32) -> Result<Option<PostSummary>> {
    let row = self.summary_by_id.query_opt(&[&viewer, &post_id]).await?;
    Ok(row.as_ref().map(post_summary_from_row))
  }

  pub async fn get_posts(&self, viewer: Option<i32>) -> Result<Vec<PostSummary>> {
    let rows = self.get_posts.query(&[&viewer]).await?;
    Ok(rows.iter().map(post_summary_from_row).collect())
  }

  pub async fn get_by_author(&self, viewer: Option<i32>, author_id: i32) -> Result<Vec<PostSummary>> {
    let rows = self.posts_by_author.query(&[&viewer, &author_id]).await?;
    Ok(rows.iter().map(post_summary_from_row).collect())
  }

  pub async fn store(&self, author_id: i32, changes: &PostChanges) -> Result<Post> {
    let row = self.store_post.query_one(&[&author_id, &changes.title, &changes.content]).await?;
    Ok(post_from_row(&row))
  }

  pub async fn update(&self, post_id: i32, author_id: i32, changes: &PostChanges) -> Result<u64> {
    self.update_post.execute(&[&post_id, &author_id, &changes.title, &changes.content]).await
  }

  pub async fn delete(&self, post_id: i32, author_id: i32) -> Result<u64> {
    self.delete_post.execute(&[&post_id, &author_id]).await
  }
}

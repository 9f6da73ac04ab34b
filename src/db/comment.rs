use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use tokio_postgres::Row;

#[derive(Clone)]
pub struct CommentStatements {
  // store comment
  store_comment: VersionedStatement,

  // get a post's comments
  comments_by_post: VersionedStatement,
}

lazy_static! {
  static ref COMMENT_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "comments",
      columns: vec![
        primary("id"),
        column("post_id"),
        column("author_id"),
        column("content"),
        generated("created_at"),
      ],
    }
  };
}

fn comment_from_row(row: &Row) -> Comment {
  Comment {
    id: row.get(0),
    post_id: row.get(1),
    author_id: row.get(2),
    content: row.get(3),
    created_at: row.get(4),
  }
}

fn comment_details_from_row(row: &Row) -> CommentDetails {
  CommentDetails {
    comment: comment_from_row(row),
    author: row.get(5),
  }
}

impl CommentStatements {
  pub fn new(cl: &SharedClient) -> CommentStatements {
    let store_comment = VersionedStatement::new(cl.clone(),
        &COMMENT_COLUMNS.build_insert_query());

    let comments_by_post = VersionedStatement::new(cl.clone(),
        &format!(r#"SELECT {}, u.username
          FROM comments c INNER JOIN users u ON c.author_id = u.id
          WHERE c.post_id = $1
          ORDER BY c.created_at, c.id"#, COMMENT_COLUMNS.get_columns(Some("c"))));

    CommentStatements {
      store_comment,
      comments_by_post,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.store_comment.prepare().await?;
    self.comments_by_post.prepare().await?;
    Ok(())
  }

  pub async fn store(&self, post_id: i32, author_id: i32, content: &str) -> Result<Comment> {
    let row = self.store_comment.query_one(&[&post_id, &author_id, &content]).await?;
    Ok(comment_from_row(&row))
  }

  pub async fn get_by_post(&self, post_id: i32) -> Result<Vec<CommentDetails>> {
    let rows = self.comments_by_post.query(&[&post_id]).await?;
    Ok(rows.iter().map(comment_details_from_row).collect())
  }
}

use crate::error::*;
use crate::models::*;

use crate::db::*;
use crate::db::util::*;

use tokio_postgres::Row;

#[derive(Clone)]
pub struct UserStatements {
  // gets
  user_by_id: VersionedStatement,
  user_by_username: VersionedStatement,

  // store user and their empty profile
  store_user: VersionedStatement,

  update_password: VersionedStatement,
  delete_user: VersionedStatement,
}

lazy_static! {
  static ref USER_COLUMNS: ColumnMappers = {
    ColumnMappers {
      table_name: "users",
      columns: vec![
        primary("id"),
        column("username"),
        column("email"),
        column("password"),
        generated("created_at"),
      ],
    }
  };
}

fn user_from_row(row: &Row) -> User {
  User {
    id: row.get(0),
    username: row.get(1),
    email: row.get(2),
    password: row.get(3),
    created_at: row.get(4),
  }
}

impl UserStatements {
  pub fn new(cl: &SharedClient) -> UserStatements {
    let select = USER_COLUMNS.build_select_query();
    let user_by_id = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE id = $1"#, select));
    let user_by_username = VersionedStatement::new(cl.clone(),
        &format!(r#"{} WHERE username = $1"#, select));

    // A taken username yields no row.
    let store_user = VersionedStatement::new(cl.clone(),
        &format!(r#"WITH new_user AS (
          {}
        ), new_profile AS (
          INSERT INTO profiles(user_id) SELECT id FROM new_user
        )
        SELECT {} FROM new_user"#,
        USER_COLUMNS.build_insert_or_ignore("(username)"),
        USER_COLUMNS.get_columns(None)));

    let update_password = VersionedStatement::new(cl.clone(),
        r#"UPDATE users SET password = $2 WHERE id = $1"#);
    let delete_user = VersionedStatement::new(cl.clone(),
        r#"DELETE FROM users WHERE id = $1"#);

    UserStatements {
      user_by_id,
      user_by_username,
      store_user,
      update_password,
      delete_user,
    }
  }

  pub async fn prepare(&self) -> Result<()> {
    self.user_by_id.prepare().await?;
    self.user_by_username.prepare().await?;
    self.store_user.prepare().await?;
    self.update_password.prepare().await?;
    self.delete_user.prepare().await?;
    Ok(())
  }

  pub async fn get_by_id(&self, user_id: i32) -> Result<Option<User>> {
    let row = self.user_by_id.query_opt(&[&user_id]).await?;
    Ok(row.as_ref().map(user_from_row))
  }

  pub async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
    let row = self.user_by_username.query_opt(&[&username]).await?;
    Ok(row.as_ref().map(user_from_row))
  }

  pub async fn store(&self, user: &NewUser) -> Result<Option<User>> {
    let row = self.store_user.query_opt(&[&user.username, &user.email, &user.password]).await?;
    Ok(row.as_ref().map(user_from_row))
  }

  pub async fn update_password(&self, user_id: i32, password: &str) -> Result<u64> {
    self.update_password.execute(&[&user_id, &password]).await
  }

  pub async fn delete(&self, user_id: i32) -> Result<u64> {
    self.delete_user.execute(&[&user_id]).await
  }
}

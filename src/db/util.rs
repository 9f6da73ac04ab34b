#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnNote {
  Primary,
  Generated,
  None,
}

#[derive(Debug, Clone)]
pub struct ColumnMapper {
  pub name: String,
  pub column: String,
  pub note: ColumnNote,
}

pub fn column(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    name: name.to_string(),
    column: name.to_string(),
    note: ColumnNote::None,
  }
}

/// Primary key, filled in by the database.
pub fn primary(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    note: ColumnNote::Primary,
    ..column(name)
  }
}

/// Column with a database default (timestamps).
pub fn generated(name: &'static str) -> ColumnMapper {
  ColumnMapper {
    note: ColumnNote::Generated,
    ..column(name)
  }
}

#[derive(Debug, Default, Clone)]
pub struct ColumnMappers {
  pub table_name: &'static str,
  pub columns: Vec<ColumnMapper>,
}

impl ColumnMappers {
  fn writable(&self) -> impl Iterator<Item = &ColumnMapper> {
    self.columns.iter().filter(|col| col.note == ColumnNote::None)
  }

  /// Comma separated list of all columns, optionally prefixed with a table alias.
  pub fn get_columns(&self, alias: Option<&str>) -> String {
    self.columns.iter().map(|col| {
      match alias {
        Some(alias) => format!("{}.{}", alias, col.column),
        None => col.column.clone(),
      }
    }).collect::<Vec<String>>().join(", ")
  }

  pub fn build_select_query(&self) -> String {
    format!("SELECT {} FROM {}", self.get_columns(None), self.table_name)
  }

  fn build_insert(&self, on_conflict: Option<&str>) -> String {
    let mut names = Vec::new();
    let mut values = Vec::new();
    for (idx, col) in self.writable().enumerate() {
      names.push(col.column.clone());
      values.push(format!("${}", idx + 1));
    }
    let conflict = match on_conflict {
      Some(target) => format!(" ON CONFLICT {} DO NOTHING", target),
      None => String::new(),
    };
    format!("INSERT INTO {}({}) VALUES({}){} RETURNING {}",
      self.table_name, names.join(", "), values.join(", "), conflict, self.get_columns(None))
  }

  /// Insert all writable columns, returning the full row.
  pub fn build_insert_query(&self) -> String {
    self.build_insert(None)
  }

  /// Like `build_insert_query`, but a conflict on `on_conflict` returns no row.
  pub fn build_insert_or_ignore(&self, on_conflict: &str) -> String {
    self.build_insert(Some(on_conflict))
  }

  /// Update all writable columns except `lookup`, which becomes the last parameter.
  pub fn build_update_where(&self, lookup: &str) -> String {
    let mut sets = Vec::new();
    let mut lookup_column = lookup.to_string();
    for col in self.writable() {
      if col.name == lookup {
        lookup_column = col.column.clone();
      } else {
        sets.push(format!("{} = ${}", col.column, sets.len() + 1));
      }
    }
    format!("UPDATE {} SET {} WHERE {} = ${}",
      self.table_name, sets.join(", "), lookup_column, sets.len() + 1)
  }
}

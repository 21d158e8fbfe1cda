use diesel::prelude::{Queryable, Selectable};

use super::Id;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    user_id: Id,
    full_name: String,
    group_name: String,
}

impl Student {
    pub const fn user_id(&self) -> &Id {
        &self.user_id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }
}

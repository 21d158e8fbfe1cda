use diesel::ExpressionMethods;
use diesel::OptionalExtension;
use diesel::QueryDsl;
use diesel::RunQueryDsl;
use diesel::SelectableHelper;

use crate::integration::db::Pool;
use crate::schema::{students, teachers, users};

use super::Id;
use super::model::Student;

pub trait UserRepository {
    fn exists(&self, id: &Id) -> super::Result<bool>;

    fn find_all_ids(&self) -> super::Result<Vec<Id>>;

    fn find_students_by_group(&self, group_name: &str) -> super::Result<Vec<Student>>;

    fn find_student(&self, id: &Id) -> super::Result<Option<Student>>;

    fn find_display_name(&self, id: &Id) -> super::Result<Option<String>>;
}

pub struct SqliteUserRepository {
    pool: Pool,
}

impl SqliteUserRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

impl UserRepository for SqliteUserRepository {
    fn exists(&self, id: &Id) -> super::Result<bool> {
        let mut conn = self.pool.get()?;

        let found = users::table
            .find(id)
            .select(users::id)
            .first::<Id>(&mut conn)
            .optional()?;

        Ok(found.is_some())
    }

    fn find_all_ids(&self) -> super::Result<Vec<Id>> {
        let mut conn = self.pool.get()?;

        let ids = users::table
            .select(users::id)
            .order(users::id.asc())
            .load::<Id>(&mut conn)?;

        Ok(ids)
    }

    fn find_students_by_group(&self, group_name: &str) -> super::Result<Vec<Student>> {
        let mut conn = self.pool.get()?;

        let students = students::table
            .filter(students::group_name.eq(group_name))
            .select(Student::as_select())
            .load(&mut conn)?;

        Ok(students)
    }

    fn find_student(&self, id: &Id) -> super::Result<Option<Student>> {
        let mut conn = self.pool.get()?;

        let student = students::table
            .filter(students::user_id.eq(id))
            .select(Student::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(student)
    }

    fn find_display_name(&self, id: &Id) -> super::Result<Option<String>> {
        let mut conn = self.pool.get()?;

        let student = students::table
            .filter(students::user_id.eq(id))
            .select(students::full_name)
            .first::<String>(&mut conn)
            .optional()?;

        if student.is_some() {
            return Ok(student);
        }

        let teacher = teachers::table
            .filter(teachers::user_id.eq(id))
            .select(teachers::full_name)
            .first::<String>(&mut conn)
            .optional()?;

        Ok(teacher)
    }
}

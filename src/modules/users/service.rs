use anyhow::{Context, anyhow};
use sqlx::PgPool;
use tracing::instrument;

use academy_core::{AppError, hash_password_async};
use academy_models::enrollments::EnrollmentDetail;
use academy_models::{EnrollmentStatus, UserId, UserRole};

use crate::modules::enrollments::service::EnrollmentService;
use crate::modules::users::model::{
    ChildCourses, ChildrenCoursesResponse, Parent, Profile, ProfileDto, Student, StudentDetail,
    UpdateUserDto, User, UserDetail,
};

/// Column list matching [`User`]'s `FromRow`.
pub const USER_COLUMNS: &str = "id, email, password, phone_number, first_name, last_name, role, \
     is_verified, is_active, is_staff, is_superuser, date_joined, last_login";

const PROFILE_COLUMNS: &str = "id, user_id, bio, address, city, state, zip_code, country, \
     date_of_birth, gender, date_joined, last_login";

const STUDENT_COLUMNS: &str =
    "id, user_id, student_id, current_class, current_school, linking_code, parent_id";

pub struct UserService;

impl UserService {
    #[instrument(skip(db))]
    pub async fn get_users(db: &PgPool) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY date_joined DESC",
            USER_COLUMNS
        ))
        .fetch_all(db)
        .await
        .context("Failed to fetch users")
        .map_err(AppError::database)?;

        Ok(users)
    }

    #[instrument(skip(db))]
    pub async fn get_user(db: &PgPool, id: UserId) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(db)
            .await
            .context("Failed to fetch user by ID")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_by_email(db: &PgPool, email: &str) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email.trim().to_lowercase())
        .fetch_optional(db)
        .await
        .context("Failed to fetch user by email")
        .map_err(AppError::database)?
        .ok_or_else(|| AppError::not_found(anyhow!("User not found")))
    }

    #[instrument(skip(db))]
    pub async fn get_profile(db: &PgPool, user_id: UserId) -> Result<Option<Profile>, AppError> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {} FROM profiles WHERE user_id = $1",
            PROFILE_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await?;

        Ok(profile)
    }

    /// Applies a partial update to the user and, when given, its profile.
    /// The profile row is created when it does not exist yet.
    #[instrument(skip(db, dto))]
    pub async fn update_user(
        db: &PgPool,
        id: UserId,
        dto: UpdateUserDto,
    ) -> Result<(User, Option<Profile>), AppError> {
        let current = Self::get_user(db, id).await?;

        if dto.role == Some(UserRole::Admin) && !current.is_superuser {
            return Err(AppError::invalid("Only superusers can have 'admin' role."));
        }

        let password_hash = match dto.password.as_deref() {
            Some(password) => Some(hash_password_async(password).await?),
            None => None,
        };

        let mut tx = db.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                email = COALESCE($1, email),
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                phone_number = COALESCE($4, phone_number),
                role = COALESCE($5, role),
                password = COALESCE($6, password)
             WHERE id = $7
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(dto.email.map(|e| e.trim().to_lowercase()))
        .bind(dto.first_name)
        .bind(dto.last_name)
        .bind(dto.phone_number)
        .bind(dto.role)
        .bind(password_hash)
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e
                && db_err.is_unique_violation()
            {
                return AppError::invalid("User with this email already exists.");
            }
            AppError::database(e)
        })?;

        if let Some(profile) = dto.profile {
            Self::upsert_profile(&mut tx, id, profile).await?;
        }

        tx.commit().await?;

        let profile = Self::get_profile(db, id).await?;
        Ok((user, profile))
    }

    async fn upsert_profile(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        user_id: UserId,
        dto: ProfileDto,
    ) -> Result<(), AppError> {
        sqlx::query("INSERT INTO profiles (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        sqlx::query(
            "UPDATE profiles SET
                bio = COALESCE($1, bio),
                address = COALESCE($2, address),
                city = COALESCE($3, city),
                state = COALESCE($4, state),
                zip_code = COALESCE($5, zip_code),
                country = COALESCE($6, country),
                date_of_birth = COALESCE($7, date_of_birth),
                gender = COALESCE($8, gender)
             WHERE user_id = $9",
        )
        .bind(dto.bio)
        .bind(dto.address)
        .bind(dto.city)
        .bind(dto.state)
        .bind(dto.zip_code)
        .bind(dto.country)
        .bind(dto.date_of_birth)
        .bind(dto.gender)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    #[instrument(skip(db))]
    pub async fn get_parent(db: &PgPool, user_id: UserId) -> Result<Parent, AppError> {
        sqlx::query_as::<_, Parent>(
            "SELECT id, user_id, parent_id, occupation, relationship_to_student
             FROM parents WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::forbidden("Only parents can access this endpoint."))
    }

    /// Attaches the student owning `linking_code` to the calling parent.
    #[instrument(skip(db))]
    pub async fn link_child(
        db: &PgPool,
        parent_user_id: UserId,
        linking_code: &str,
    ) -> Result<StudentDetail, AppError> {
        let parent = Self::get_parent(db, parent_user_id).await?;

        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE linking_code = $1",
            STUDENT_COLUMNS
        ))
        .bind(linking_code.trim().to_uppercase())
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::invalid("Invalid linking code."))?;

        if student.parent_id.is_some() {
            return Err(AppError::invalid(
                "This student is already linked to a parent.",
            ));
        }

        // Guarded again in SQL so two parents racing on one code cannot both win.
        let student = sqlx::query_as::<_, Student>(&format!(
            "UPDATE students SET parent_id = $1
             WHERE id = $2 AND parent_id IS NULL
             RETURNING {}",
            STUDENT_COLUMNS
        ))
        .bind(parent.id)
        .bind(student.id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| AppError::invalid("This student is already linked to a parent."))?;

        let user = Self::get_user(db, student.user_id).await?;
        Ok(StudentDetail {
            student,
            user: UserDetail::from(user),
        })
    }

    /// Every linked child with its enrollments and per-child counts.
    #[instrument(skip(db))]
    pub async fn children_courses(
        db: &PgPool,
        parent_user_id: UserId,
    ) -> Result<ChildrenCoursesResponse, AppError> {
        let parent_user = Self::get_user(db, parent_user_id).await?;
        let parent = Self::get_parent(db, parent_user_id).await?;

        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {} FROM students WHERE parent_id = $1",
            STUDENT_COLUMNS
        ))
        .bind(parent.id)
        .fetch_all(db)
        .await?;

        let mut children = Vec::with_capacity(students.len());
        for student in students {
            let child = Self::get_user(db, student.user_id).await?;
            let enrollments = EnrollmentService::list_for_user(db, student.user_id).await?;
            children.push(child_courses(UserDetail::from(child), student, enrollments));
        }

        Ok(summarize_children(parent_user, children))
    }
}

fn child_courses(
    child: UserDetail,
    student: Student,
    enrollments: Vec<EnrollmentDetail>,
) -> ChildCourses {
    let count = |status: EnrollmentStatus| enrollments.iter().filter(|e| e.status == status).count();

    ChildCourses {
        child,
        student_id: student.student_id,
        current_class: student.current_class,
        current_school: student.current_school,
        total_enrollments: enrollments.len(),
        active_enrollments: count(EnrollmentStatus::Active),
        completed_enrollments: count(EnrollmentStatus::Completed),
        enrollments,
    }
}

fn summarize_children(parent: User, children: Vec<ChildCourses>) -> ChildrenCoursesResponse {
    let message = children
        .is_empty()
        .then(|| "No children linked to this parent account.".to_string());

    ChildrenCoursesResponse {
        parent_name: parent.full_name(),
        parent_email: parent.email,
        total_children: children.len(),
        total_enrollments: children.iter().map(|c| c.total_enrollments).sum(),
        total_active_enrollments: children.iter().map(|c| c.active_enrollments).sum(),
        total_completed_enrollments: children.iter().map(|c| c.completed_enrollments).sum(),
        children,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(email: &str) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            password: String::new(),
            phone_number: String::new(),
            first_name: "Ngozi".to_string(),
            last_name: "Eze".to_string(),
            role: UserRole::Parent,
            is_verified: true,
            is_active: true,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn no_children_adds_message() {
        let summary = summarize_children(user("p@example.com"), Vec::new());
        assert_eq!(summary.total_children, 0);
        assert_eq!(
            summary.message.as_deref(),
            Some("No children linked to this parent account.")
        );
        assert_eq!(summary.parent_name, "Ngozi Eze");
    }

    #[test]
    fn child_counts_follow_status() {
        let child = UserDetail::from(user("c@example.com"));
        let student = Student {
            id: academy_models::StudentId::new(),
            user_id: child.id,
            student_id: Some("STU1".to_string()),
            current_class: None,
            current_school: None,
            linking_code: "ABCDEFGH".to_string(),
            parent_id: None,
        };
        let courses = child_courses(child, student, Vec::new());
        assert_eq!(courses.total_enrollments, 0);
        assert_eq!(courses.active_enrollments, 0);
        assert_eq!(courses.student_id.as_deref(), Some("STU1"));
    }
}

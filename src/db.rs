use std::collections::HashMap;

use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::{ContactNote, CourseRecord, CreditCategory, DualCreditType, StudentRecord};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let categories = vec![
        ("English", 4.0, 1),
        ("Mathematics", 3.0, 2),
        ("Science", 3.0, 3),
        ("Social Studies", 3.5, 4),
        ("Health and PE", 2.0, 5),
        ("World Language", 2.0, 6),
        ("Arts and CTE", 1.5, 7),
        ("Electives", 5.0, 8),
    ];

    for (name, required_credits, display_order) in categories {
        sqlx::query(
            r#"
            INSERT INTO credit_audit.categories (id, name, required_credits, display_order)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (name) DO UPDATE
            SET required_credits = EXCLUDED.required_credits,
                display_order = EXCLUDED.display_order
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(required_credits)
        .bind(display_order)
        .execute(pool)
        .await?;
    }

    let students = vec![
        (
            Uuid::parse_str("3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2")?,
            "Avery Lee",
            "avery.lee@rosemont.edu",
            11,
            2027,
        ),
        (
            Uuid::parse_str("0c22f1f1-9184-4fd4-9b21-28c68a6a89dc")?,
            "Jules Moreno",
            "jules.moreno@rosemont.edu",
            9,
            2029,
        ),
        (
            Uuid::parse_str("d5a0a1a2-2a3c-44c2-8f73-60b7897a9dd2")?,
            "Kiara Patel",
            "kiara.patel@rosemont.edu",
            12,
            2026,
        ),
    ];

    for (id, full_name, email, grade_level, graduation_year) in students {
        sqlx::query(
            r#"
            INSERT INTO credit_audit.students (id, full_name, email, grade_level, graduation_year)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                grade_level = EXCLUDED.grade_level,
                graduation_year = EXCLUDED.graduation_year
            "#,
        )
        .bind(id)
        .bind(full_name)
        .bind(email)
        .bind(grade_level)
        .bind(graduation_year)
        .execute(pool)
        .await?;
    }

    let courses = vec![
        (
            "seed-001",
            "avery.lee@rosemont.edu",
            "English 9",
            1.0,
            Some("English"),
            "2024-T1",
            Some("B"),
            None,
        ),
        (
            "seed-002",
            "avery.lee@rosemont.edu",
            "English 10",
            1.0,
            Some("English"),
            "2025-T1",
            Some("B+"),
            None,
        ),
        (
            "seed-003",
            "avery.lee@rosemont.edu",
            "Algebra I",
            1.0,
            Some("Mathematics"),
            "2024-T2",
            Some("C"),
            None,
        ),
        (
            "seed-004",
            "avery.lee@rosemont.edu",
            "Biology",
            1.0,
            Some("Science"),
            "2024-T3",
            Some("B"),
            None,
        ),
        (
            "seed-005",
            "avery.lee@rosemont.edu",
            "World History",
            1.0,
            Some("Social Studies"),
            "2025-T1",
            Some("A-"),
            None,
        ),
        (
            "seed-006",
            "avery.lee@rosemont.edu",
            "Intro to Composition",
            1.0,
            Some("Electives"),
            "2025-T2",
            Some("A"),
            Some("associate"),
        ),
        (
            "seed-007",
            "avery.lee@rosemont.edu",
            "PE 9",
            1.0,
            Some("Health and PE"),
            "2024-T1",
            Some("A"),
            None,
        ),
        (
            "seed-008",
            "avery.lee@rosemont.edu",
            "Spanish I",
            1.0,
            Some("World Language"),
            "2025-T2",
            Some("B"),
            None,
        ),
        (
            "seed-009",
            "avery.lee@rosemont.edu",
            "Study Skills",
            1.0,
            None,
            "2024-T2",
            None,
            None,
        ),
        (
            "seed-010",
            "jules.moreno@rosemont.edu",
            "English 9",
            0.5,
            Some("English"),
            "2025-T1",
            None,
            None,
        ),
        (
            "seed-011",
            "kiara.patel@rosemont.edu",
            "College Algebra",
            1.0,
            Some("Mathematics"),
            "2025-T1",
            Some("A"),
            Some("both"),
        ),
        (
            "seed-012",
            "kiara.patel@rosemont.edu",
            "Intro to Psychology",
            1.0,
            Some("Electives"),
            "2025-T2",
            Some("A-"),
            Some("transfer"),
        ),
    ];

    for (source_key, email, name, credits, category, term, grade, dual_type) in courses {
        let student_id: Uuid =
            sqlx::query("SELECT id FROM credit_audit.students WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get("id");

        let category_id: Option<Uuid> = match category {
            Some(category_name) => Some(
                sqlx::query("SELECT id FROM credit_audit.categories WHERE name = $1")
                    .bind(category_name)
                    .fetch_one(pool)
                    .await?
                    .get("id"),
            ),
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO credit_audit.courses
            (id, student_id, name, credits, category_id, term, grade,
             is_dual_credit, dual_credit_type, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(name)
        .bind(credits)
        .bind(category_id)
        .bind(term)
        .bind(grade)
        .bind(dual_type.is_some())
        .bind(dual_type)
        .bind(NaiveDate::from_ymd_opt(2025, 11, 3).context("invalid date")?)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    let notes = vec![
        (
            "avery.lee@rosemont.edu",
            "Discussed summer credit recovery options",
            NaiveDate::from_ymd_opt(2025, 11, 4).context("invalid date")?,
        ),
        (
            "jules.moreno@rosemont.edu",
            "Intro meeting, no concerns yet",
            NaiveDate::from_ymd_opt(2025, 10, 28).context("invalid date")?,
        ),
    ];

    for (email, note, noted_on) in notes {
        insert_note(pool, email, note, noted_on).await?;
    }

    Ok(())
}

pub async fn fetch_categories(pool: &PgPool) -> anyhow::Result<Vec<CreditCategory>> {
    let records = sqlx::query(
        "SELECT id, name, required_credits, display_order \
         FROM credit_audit.categories ORDER BY display_order",
    )
    .fetch_all(pool)
    .await?;

    let mut categories = Vec::new();
    for row in records {
        categories.push(CreditCategory {
            id: row.get("id"),
            name: row.get("name"),
            required_credits: row.get("required_credits"),
            display_order: row.get("display_order"),
        });
    }

    Ok(categories)
}

pub async fn fetch_students(
    pool: &PgPool,
    grade: Option<i32>,
    email: Option<&str>,
) -> anyhow::Result<Vec<StudentRecord>> {
    let mut query = String::from(
        "SELECT id, full_name, email, grade_level, graduation_year \
         FROM credit_audit.students",
    );

    if grade.is_some() {
        query.push_str(" WHERE grade_level = $1");
    } else if email.is_some() {
        query.push_str(" WHERE email = $1");
    }
    query.push_str(" ORDER BY full_name");

    let mut rows = sqlx::query(&query);

    if let Some(value) = grade {
        rows = rows.bind(value);
    } else if let Some(value) = email {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut students = Vec::new();

    for row in records {
        students.push(StudentRecord {
            id: row.get("id"),
            full_name: row.get("full_name"),
            email: row.get("email"),
            grade_level: row.get("grade_level"),
            graduation_year: row.get("graduation_year"),
        });
    }

    Ok(students)
}

pub async fn fetch_courses(
    pool: &PgPool,
    grade: Option<i32>,
    email: Option<&str>,
) -> anyhow::Result<Vec<CourseRecord>> {
    let mut query = String::from(
        "SELECT c.id, c.student_id, c.name, c.credits, c.category_id, c.term, \
         c.grade, c.is_dual_credit, c.dual_credit_type, c.recorded_at \
         FROM credit_audit.courses c \
         JOIN credit_audit.students st ON st.id = c.student_id",
    );

    if grade.is_some() {
        query.push_str(" WHERE st.grade_level = $1");
    } else if email.is_some() {
        query.push_str(" WHERE st.email = $1");
    }

    let mut rows = sqlx::query(&query);

    if let Some(value) = grade {
        rows = rows.bind(value);
    } else if let Some(value) = email {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut courses = Vec::new();

    for row in records {
        let dual_credit_type: Option<String> = row.get("dual_credit_type");
        courses.push(CourseRecord {
            id: row.get("id"),
            student_id: row.get("student_id"),
            name: row.get("name"),
            credits: row.get("credits"),
            category_id: row.get("category_id"),
            term: row.get("term"),
            grade: row.get("grade"),
            is_dual_credit: row.get("is_dual_credit"),
            dual_credit_type: dual_credit_type.as_deref().and_then(DualCreditType::parse),
            recorded_at: row.get("recorded_at"),
        });
    }

    Ok(courses)
}

pub async fn fetch_recent_notes(
    pool: &PgPool,
    grade: Option<i32>,
    email: Option<&str>,
) -> anyhow::Result<Vec<ContactNote>> {
    let mut query = String::from(
        "SELECT st.full_name, st.email, n.note, n.noted_on \
         FROM credit_audit.contact_notes n \
         JOIN credit_audit.students st ON st.id = n.student_id",
    );

    if grade.is_some() {
        query.push_str(" WHERE st.grade_level = $1");
    } else if email.is_some() {
        query.push_str(" WHERE st.email = $1");
    }
    query.push_str(" ORDER BY n.noted_on DESC");

    let mut rows = sqlx::query(&query);

    if let Some(value) = grade {
        rows = rows.bind(value);
    } else if let Some(value) = email {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut notes = Vec::new();

    for row in records {
        notes.push(ContactNote {
            student_name: row.get("full_name"),
            student_email: row.get("email"),
            note: row.get("note"),
            noted_on: row.get("noted_on"),
        });
    }

    Ok(notes)
}

pub async fn insert_note(
    pool: &PgPool,
    email: &str,
    note: &str,
    noted_on: NaiveDate,
) -> anyhow::Result<()> {
    let student_id: Uuid = sqlx::query("SELECT id FROM credit_audit.students WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?
        .map(|row| row.get("id"))
        .with_context(|| format!("no student with email {email}"))?;

    sqlx::query(
        r#"
        INSERT INTO credit_audit.contact_notes (id, student_id, note, noted_on)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(student_id)
    .bind(note)
    .bind(noted_on)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        grade_level: i32,
        graduation_year: i32,
        course_name: String,
        credits: f64,
        category: Option<String>,
        term: String,
        grade: Option<String>,
        is_dual_credit: Option<bool>,
        dual_credit_type: Option<String>,
        recorded_at: NaiveDate,
        source_key: Option<String>,
    }

    // Legacy rosters reference categories by name. Resolve once here so the
    // evaluator only ever sees ids; unmatched names load as uncategorized.
    let categories = fetch_categories(pool).await?;
    let categories_by_name: HashMap<String, Uuid> = categories
        .into_iter()
        .map(|category| (category.name.to_ascii_lowercase(), category.id))
        .collect();

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO credit_audit.students
            (id, full_name, email, grade_level, graduation_year)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE
            SET full_name = EXCLUDED.full_name,
                grade_level = EXCLUDED.grade_level,
                graduation_year = EXCLUDED.graduation_year
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.full_name)
        .bind(&row.email)
        .bind(row.grade_level)
        .bind(row.graduation_year)
        .fetch_one(pool)
        .await?
        .get("id");

        let category_id = row
            .category
            .as_deref()
            .and_then(|name| categories_by_name.get(&name.trim().to_ascii_lowercase()))
            .copied();

        let dual_credit_type = row.dual_credit_type.as_deref().and_then(DualCreditType::parse);
        let is_dual_credit = row.is_dual_credit.unwrap_or(false) || dual_credit_type.is_some();

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO credit_audit.courses
            (id, student_id, name, credits, category_id, term, grade,
             is_dual_credit, dual_credit_type, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(&row.course_name)
        .bind(row.credits)
        .bind(category_id)
        .bind(&row.term)
        .bind(&row.grade)
        .bind(is_dual_credit)
        .bind(dual_credit_type.map(DualCreditType::as_str))
        .bind(row.recorded_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

// Wipes the configured database and fills it with sample data.
//
// Usage: cargo run --bin seed

use chrono::{Duration, NaiveDate, Utc};
use medical_center_api::{config::Config, db, models::AppointmentStatus, validation};
use tracing_subscriber::EnvFilter;

struct SeedDoctor {
    name: &'static str,
    specialization: &'static str,
    email: &'static str,
    phone: &'static str,
    license_number: &'static str,
    bio: &'static str,
}

struct SeedPatient {
    first_name: &'static str,
    last_name: &'static str,
    email: &'static str,
    phone: &'static str,
    date_of_birth: (i32, u32, u32),
    address: &'static str,
    medical_history: &'static str,
    allergies: Option<&'static str>,
}

const DOCTORS: [SeedDoctor; 3] = [
    SeedDoctor {
        name: "Dr. Айберген Сәлеуов",
        specialization: "Кардиолог",
        email: "aibergenc@medicalcenter.com",
        phone: "+7 (701) 123-4567",
        license_number: "MED001",
        bio: "20 жылдық тәжірибесі бар кардиолог",
    },
    SeedDoctor {
        name: "Dr. Гүлнар Әлеуова",
        specialization: "Невролог",
        email: "gulnar@medicalcenter.com",
        phone: "+7 (702) 234-5678",
        license_number: "MED002",
        bio: "Неврологиялық ауруларының бөлмелеуінде мәмлекеттік мамандар",
    },
    SeedDoctor {
        name: "Dr. Ерсултан Қоңғырбаев",
        specialization: "Ортопед",
        email: "ersultan@medicalcenter.com",
        phone: "+7 (703) 345-6789",
        license_number: "MED003",
        bio: "Сүйектер мен буындарының ауруларында ынамды мамандар",
    },
];

const PATIENTS: [SeedPatient; 3] = [
    SeedPatient {
        first_name: "Нұрлан",
        last_name: "Сәрсембаев",
        email: "nurlan@example.com",
        phone: "+7 (701) 111-2222",
        date_of_birth: (1985, 3, 15),
        address: "Алматы қ., Медеу ауданы",
        medical_history: "Құсыры ауруы",
        allergies: Some("Пенициллин"),
    },
    SeedPatient {
        first_name: "Айнара",
        last_name: "Досова",
        email: "ainara@example.com",
        phone: "+7 (702) 222-3333",
        date_of_birth: (1990, 7, 22),
        address: "Алматы қ., Алмалы ауданы",
        medical_history: "Диабет",
        allergies: None,
    },
    SeedPatient {
        first_name: "Барлас",
        last_name: "Кәрім",
        email: "barlas@example.com",
        phone: "+7 (703) 333-4444",
        date_of_birth: (1988, 11, 8),
        address: "Алматы қ., Түстік Қазақстан",
        medical_history: "Артериялық гипертензия",
        allergies: Some("Аспирин"),
    },
];

// name, description, price, duration_minutes
const SERVICES: [(&str, &str, f64, i64); 5] = [
    ("Жүрек ҚҚД", "Жүрек сәл ықшамасының толық диагностикасы", 15000.0, 30),
    ("Х-сәл фото", "Жүйелі Х-сәл фото", 8000.0, 15),
    ("УЗИ диагностика", "УЗИ аппаратымен ауру аймақтарын зерттеу", 12000.0, 20),
    ("ОҚР қызметі", "Есептелінген қоршеген радиография", 25000.0, 45),
    ("Тер зерттеу", "Қан пікірінің толық зерттеуі", 5000.0, 10),
];

// patient index, doctor index, days ahead, hour offset, notes
const APPOINTMENTS: [(usize, usize, i64, i64, Option<&str>); 3] = [
    (0, 0, 2, 9, Some("Ең бірінші болу барлық рецепт болмағында аса арзан")),
    (1, 1, 3, 14, Some("Басының ауырысын теме болса да болмаса да болса да оңай")),
    (2, 2, 5, 10, None),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cfg = Config::from_env()?;
    let pool = db::connect_sqlite(&cfg.database_url, 1).await?;
    db::create_schema(&pool).await?;

    let mut tx = pool.begin().await?;

    for table in ["appointments", "doctors", "patients", "services"] {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;
    }

    let mut doctor_ids = Vec::with_capacity(DOCTORS.len());
    for d in &DOCTORS {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO doctors (name, specialization, email, phone, license_number, bio, is_active,
                                 name_lc, specialization_lc, email_lc)
            VALUES ($1,$2,$3,$4,$5,$6,1,$7,$8,$9)
            RETURNING id
            "#,
        )
        .bind(d.name)
        .bind(d.specialization)
        .bind(d.email)
        .bind(d.phone)
        .bind(d.license_number)
        .bind(d.bio)
        .bind(validation::fold_case(d.name))
        .bind(validation::fold_case(d.specialization))
        .bind(validation::fold_case(d.email))
        .fetch_one(&mut *tx)
        .await?;
        doctor_ids.push(id);
    }

    let mut patient_ids = Vec::with_capacity(PATIENTS.len());
    for p in &PATIENTS {
        let (y, m, day) = p.date_of_birth;
        let dob = NaiveDate::from_ymd_opt(y, m, day)
            .ok_or_else(|| anyhow::anyhow!("bad seed birth date for {}", p.email))?;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO patients (first_name, last_name, email, phone, date_of_birth, address,
                                  medical_history, allergies, is_active,
                                  first_name_lc, last_name_lc, email_lc)
            VALUES ($1,$2,$3,$4,$5,$6,$7,$8,1,$9,$10,$11)
            RETURNING id
            "#,
        )
        .bind(p.first_name)
        .bind(p.last_name)
        .bind(p.email)
        .bind(p.phone)
        .bind(dob)
        .bind(p.address)
        .bind(p.medical_history)
        .bind(p.allergies)
        .bind(validation::fold_case(p.first_name))
        .bind(validation::fold_case(p.last_name))
        .bind(validation::fold_case(p.email))
        .fetch_one(&mut *tx)
        .await?;
        patient_ids.push(id);
    }

    for (name, description, price, duration) in SERVICES {
        sqlx::query(
            r#"
            INSERT INTO services (name, description, price, duration_minutes, is_available,
                                  name_lc, description_lc)
            VALUES ($1,$2,$3,$4,1,$5,$6)
            "#,
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(duration)
        .bind(validation::fold_case(name))
        .bind(validation::fold_case(description))
        .execute(&mut *tx)
        .await?;
    }

    let now = Utc::now();
    for (p, d, days, hours, notes) in APPOINTMENTS {
        sqlx::query(
            r#"
            INSERT INTO appointments (patient_id, doctor_id, appointment_date, duration_minutes,
                                      status, notes, created_at)
            VALUES ($1,$2,$3,30,$4,$5,$6)
            "#,
        )
        .bind(patient_ids[p])
        .bind(doctor_ids[d])
        .bind(now + Duration::days(days) + Duration::hours(hours))
        .bind(AppointmentStatus::Scheduled)
        .bind(notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        doctors = DOCTORS.len(),
        patients = PATIENTS.len(),
        services = SERVICES.len(),
        appointments = APPOINTMENTS.len(),
        "sample data loaded"
    );
    Ok(())
}

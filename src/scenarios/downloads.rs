//! Public and private downloadable files

use anyhow::Result;

use super::{unique_title, ScenarioContext, StudentFixture};
use crate::harness::{Check, ResponseBody, TestSession};
use crate::http::MultipartPayload;

const PUBLIC_PREFIX: &str = "Test Public File";
const PRIVATE_PREFIX: &str = "Test Private File";
const STUDENT_PASSWORD: &str = "Test@123";
const FILE_NAME: &str = "test_file.txt";
const FILE_CONTENT: &[u8] = b"This is a test file for TWOEM Online Productions";

fn upload(title: &str, description: &str, file_type: &str) -> MultipartPayload {
    MultipartPayload::new()
        .text("title", title)
        .text("description", description)
        .text("file_type", file_type)
        .file("file", FILE_NAME, "text/plain", FILE_CONTENT)
}

fn has_title(body: &ResponseBody, title: &str) -> bool {
    body.find_item("title", title).is_some()
}

/// Upload both kinds, check who sees what, then delete both
pub async fn downloads(ctx: &mut ScenarioContext) -> Result<bool> {
    let session = &mut ctx.session;
    let public_title = unique_title(PUBLIC_PREFIX);
    let private_title = unique_title(PRIVATE_PREFIX);

    let public = session
        .check(
            Check::post("Upload Public File", "admin/downloads", 200)
                .multipart(upload(&public_title, "This is a test public file", "public"))
                .as_admin(),
        )
        .await;
    if !public.passed {
        return Ok(false);
    }

    let listing = session
        .check(Check::get("Get All Downloads", "admin/downloads", 200).as_admin())
        .await;
    if !listing.passed {
        return Ok(false);
    }
    let public_id = listing
        .body
        .find_item("title", &public_title)
        .and_then(|item| ResponseBody::Json(item.clone()).string_field("id"));
    if !session.verify(
        "Uploaded file in admin listing",
        public_id.is_some(),
        "uploaded file not found in downloads list",
    ) {
        return Ok(false);
    }
    let public_id = public_id.unwrap_or_default();

    let private = session
        .check(
            Check::post("Upload Private File", "admin/downloads", 200)
                .multipart(upload(&private_title, "This is a test private file", "private"))
                .as_admin(),
        )
        .await;
    if !private.passed {
        return Ok(false);
    }

    let public_listing = session
        .check(Check::get("Get Public Downloads", "downloads", 200).anonymous())
        .await;
    if !public_listing.passed
        || !session.verify(
            "Public file in public listing",
            has_title(&public_listing.body, &public_title),
            "public file not found in public downloads list",
        )
    {
        return Ok(false);
    }
    session.verify(
        "Private file hidden from public listing",
        !has_title(&public_listing.body, &private_title),
        "private file is visible without authentication",
    );

    let fetched = session
        .check(
            Check::get("Download Public File", format!("downloads/{public_id}"), 200).anonymous(),
        )
        .await;
    if !fetched.passed {
        return Ok(false);
    }

    let Some(student) = StudentFixture::create(
        session,
        "Create Student for Downloads Test",
        "downloadtest",
        STUDENT_PASSWORD,
    )
    .await
    else {
        return Ok(false);
    };
    let Some(token) = student.login(session, "Student Login").await else {
        return Ok(false);
    };

    let student_listing = session
        .check(Check::get("Student Downloads", "student/downloads", 200).bearer(token))
        .await;
    if !student_listing.passed
        || !session.verify(
            "Private file visible to student",
            has_title(&student_listing.body, &private_title),
            "private file not in student downloads list",
        )
    {
        return Ok(false);
    }

    let titles = [public_title.as_str(), private_title.as_str()];
    let files_deleted = delete_test_files(session, &titles).await;
    let student_removed = student.remove(session, "Delete Downloads Test Student").await;
    Ok(files_deleted && student_removed)
}

/// Delete this run's uploads, found by title in a fresh admin listing
async fn delete_test_files(session: &mut TestSession, titles: &[&str]) -> bool {
    let listing = session
        .check(Check::get("Get Downloads For Cleanup", "admin/downloads", 200).as_admin())
        .await;
    if !listing.passed {
        return false;
    }

    let targets: Vec<(String, String)> = listing
        .body
        .items()
        .iter()
        .filter_map(|item| {
            let title = item.get("title")?.as_str()?;
            if !titles.contains(&title) {
                return None;
            }
            let id = ResponseBody::Json(item.clone()).string_field("id")?;
            Some((title.to_string(), id))
        })
        .collect();

    let mut all_deleted = targets.len() == titles.len();
    for (title, id) in targets {
        all_deleted &= session
            .check(
                Check::delete(
                    format!("Delete Test File: {title}"),
                    format!("admin/downloads/{id}"),
                    200,
                )
                .as_admin(),
            )
            .await
            .passed;
    }
    all_deleted
}

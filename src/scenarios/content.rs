//! Admin-published content that students read: notifications and resources

use anyhow::Result;

use super::{unique_title, ScenarioContext, StudentFixture};
use crate::harness::{Check, ResponseBody, TestSession};
use crate::http::MultipartPayload;

const STUDENT_PASSWORD: &str = "Test@123";

/// Smallest PDF most readers accept; the portal only checks the extension
const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
2 0 obj<</Type/Pages/Kids[]/Count 0>>endobj\ntrailer<</Root 1 0 R>>\n%%EOF\n";

/// One kind of admin-managed content and where students see it
struct ContentKind {
    /// Used in check names
    label: &'static str,
    /// `admin/<collection>` and `student/<collection>`
    collection: &'static str,
    /// Student path below `student/<collection>/{id}/` serving the file
    file_route: &'static str,
    /// Title prefix; each run appends a timestamp
    title: &'static str,
}

const NOTIFICATION: ContentKind = ContentKind {
    label: "Notification",
    collection: "notifications",
    file_route: "attachment",
    title: "Test Notification",
};

const RESOURCE: ContentKind = ContentKind {
    label: "Resource",
    collection: "resources",
    file_route: "download",
    title: "Test Resource",
};

/// Notification with an attachment, broadcast to all students
pub async fn notifications(ctx: &mut ScenarioContext) -> Result<bool> {
    let payload = |title: &str, student_id: &str| {
        MultipartPayload::new()
            .text("title", title)
            .text("content", "This is a test notification for students")
            .text("target_audience", "all")
            .text("target_student_ids", student_id)
            .text("priority", "normal")
            .file(
                "file",
                "notice.txt",
                "text/plain",
                b"Notification attachment".to_vec(),
            )
    };
    publish_and_read(&mut ctx.session, &NOTIFICATION, payload).await
}

/// Learning resource with a PDF file
pub async fn resources(ctx: &mut ScenarioContext) -> Result<bool> {
    let payload = |title: &str, _: &str| {
        MultipartPayload::new()
            .text("title", title)
            .text("description", "This is a test learning resource")
            .text("subject", "Computer Studies")
            .file("file", "test_resource.pdf", "application/pdf", SAMPLE_PDF)
    };
    publish_and_read(&mut ctx.session, &RESOURCE, payload).await
}

/// Create a student, publish the item, confirm both sides see it, clean up
async fn publish_and_read<F>(
    session: &mut TestSession,
    kind: &ContentKind,
    payload: F,
) -> Result<bool>
where
    F: Fn(&str, &str) -> MultipartPayload,
{
    let Some(student) = StudentFixture::create(
        session,
        &format!("Create Student for {} Test", kind.label),
        &format!("{}test", kind.collection),
        STUDENT_PASSWORD,
    )
    .await
    else {
        return Ok(false);
    };
    let Some(token) = student.login(session, "Student Login").await else {
        return Ok(false);
    };

    let title = unique_title(kind.title);
    let admin_path = format!("admin/{}", kind.collection);
    let created = session
        .check(
            Check::post(format!("Create {}", kind.label), &admin_path, 200)
                .multipart(payload(&title, &student.id))
                .as_admin(),
        )
        .await;
    if !created.passed {
        return Ok(false);
    }

    let listing = session
        .check(Check::get(format!("Get All {}s", kind.label), &admin_path, 200).as_admin())
        .await;
    if !listing.passed {
        return Ok(false);
    }
    let item_id = listing
        .body
        .find_item("title", &title)
        .and_then(|item| ResponseBody::Json(item.clone()).string_field("id"));
    if !session.verify(
        &format!("{} in admin listing", kind.label),
        item_id.is_some(),
        format!("'{title}' not found in admin listing"),
    ) {
        return Ok(false);
    }
    let item_id = item_id.unwrap_or_default();

    let student_path = format!("student/{}", kind.collection);
    let visible = session
        .check(
            Check::get(format!("Student {}s", kind.label), &student_path, 200)
                .bearer(token.clone()),
        )
        .await;
    if !visible.passed
        || !session.verify(
            &format!("{} visible to student", kind.label),
            visible.body.find_item("title", &title).is_some(),
            format!("'{title}' not in student listing"),
        )
    {
        return Ok(false);
    }

    session
        .check(
            Check::get(
                format!("Student {} File", kind.label),
                format!("{}/{}/{}", student_path, item_id, kind.file_route),
                200,
            )
            .bearer(token),
        )
        .await;

    let deleted = session
        .check(
            Check::delete(
                format!("Delete {}", kind.label),
                format!("{admin_path}/{item_id}"),
                200,
            )
            .as_admin(),
        )
        .await;
    let removed = student
        .remove(session, &format!("Delete {} Test Student", kind.label))
        .await;

    Ok(deleted.passed && removed)
}

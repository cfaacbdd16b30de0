use super::{Gateway, GatewayError};
use crate::model::{format_date, parse_date, AttendanceRecord, AttendanceRow, Student};
use chrono::NaiveDate;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);
const PREFER: &str = "Prefer";

/// Client for a hosted PostgREST-style service exposing the two tables.
pub struct RestGateway {
    client: Client,
    base_url: String,
    auth: HeaderMap,
}

#[derive(Debug, Deserialize)]
struct StudentRow {
    id: serde_json::Value,
    name: String,
    #[serde(default)]
    created_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AttendanceRowWire {
    student_id: serde_json::Value,
    date: String,
    status: String,
    #[serde(default)]
    comment: Option<String>,
}

/// Ids are opaque; numeric identity columns become their decimal form.
fn id_string(v: &serde_json::Value) -> Option<String> {
    match v {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl StudentRow {
    fn into_student(self) -> Result<Student, GatewayError> {
        let id = id_string(&self.id).ok_or_else(|| GatewayError::InvalidRow {
            table: "students",
            message: format!("unusable id {}", self.id),
        })?;
        Ok(Student {
            id,
            name: self.name,
            created_at: self.created_at.unwrap_or_default(),
        })
    }
}

impl AttendanceRowWire {
    fn into_row(self) -> Result<AttendanceRow, GatewayError> {
        let invalid = |message: String| GatewayError::InvalidRow {
            table: "attendance",
            message,
        };
        let student_id = id_string(&self.student_id)
            .ok_or_else(|| invalid(format!("unusable student_id {}", self.student_id)))?;
        let date = parse_date(&self.date)
            .ok_or_else(|| invalid(format!("bad date {}", self.date)))?;
        let status = self.status.parse().map_err(|e| invalid(format!("{e}")))?;
        Ok(AttendanceRow {
            student_id,
            date,
            record: AttendanceRecord {
                status,
                comment: self.comment.unwrap_or_default(),
            },
        })
    }
}

impl RestGateway {
    pub fn new(url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut auth = HeaderMap::new();
        auth.insert("apikey", HeaderValue::from_str(api_key)?);
        auth.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))?,
        );
        auth.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: rest_base(url),
            auth,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    /// Every call carries the key both as `apikey` and as a bearer token.
    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .headers(self.auth.clone())
    }

    fn list_students_request(&self) -> RequestBuilder {
        self.request(Method::GET, "students")
            .query(&[("select", "*"), ("order", "name.asc")])
    }

    fn insert_student_request(&self, name: &str) -> RequestBuilder {
        self.request(Method::POST, "students")
            .header(PREFER, "return=representation")
            .json(&json!([{ "name": name }]))
    }

    fn delete_student_request(&self, student_id: &str) -> RequestBuilder {
        self.request(Method::DELETE, "students")
            .query(&[("id", format!("eq.{student_id}"))])
    }

    fn select_attendance_request(
        &self,
        student_id: &str,
        first: NaiveDate,
        last: NaiveDate,
    ) -> RequestBuilder {
        self.request(Method::GET, "attendance")
            .query(&attendance_range_query(student_id, first, last))
    }

    fn upsert_attendance_request(
        &self,
        student_id: &str,
        date: NaiveDate,
        record: &AttendanceRecord,
    ) -> RequestBuilder {
        self.request(Method::POST, "attendance")
            .query(&[("on_conflict", "student_id,date")])
            .header(PREFER, "resolution=merge-duplicates,return=minimal")
            .json(&json!([{
                "student_id": student_id,
                "date": format_date(date),
                "status": record.status.as_str(),
                "comment": record.comment,
            }]))
    }

    fn check_status(response: Response) -> Result<Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(GatewayError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

/// `https://x.supabase.co` and `https://x.supabase.co/rest/v1/` both map to
/// the `/rest/v1` root.
fn rest_base(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.ends_with("/rest/v1") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/rest/v1")
    }
}

fn attendance_range_query(
    student_id: &str,
    first: NaiveDate,
    last: NaiveDate,
) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("student_id", format!("eq.{student_id}")),
        ("date", format!("gte.{}", format_date(first))),
        ("date", format!("lte.{}", format_date(last))),
        ("order", "date.asc".to_string()),
    ]
}

impl Gateway for RestGateway {
    fn select_students(&self) -> Result<Vec<Student>, GatewayError> {
        let response = self.list_students_request().send()?;
        let rows: Vec<StudentRow> = Self::check_status(response)?.json()?;
        rows.into_iter().map(StudentRow::into_student).collect()
    }

    fn insert_student(&self, name: &str) -> Result<Student, GatewayError> {
        let response = self.insert_student_request(name).send()?;
        let rows: Vec<StudentRow> = Self::check_status(response)?.json()?;
        rows.into_iter()
            .next()
            .ok_or_else(|| GatewayError::InvalidRow {
                table: "students",
                message: "insert returned no row".to_string(),
            })?
            .into_student()
    }

    fn delete_student(&self, student_id: &str) -> Result<(), GatewayError> {
        let response = self.delete_student_request(student_id).send()?;
        Self::check_status(response)?;
        Ok(())
    }

    fn select_attendance(
        &self,
        student_id: &str,
        first: NaiveDate,
        last: NaiveDate,
    ) -> Result<Vec<AttendanceRow>, GatewayError> {
        let response = self
            .select_attendance_request(student_id, first, last)
            .send()?;
        let rows: Vec<AttendanceRowWire> = Self::check_status(response)?.json()?;
        rows.into_iter().map(AttendanceRowWire::into_row).collect()
    }

    fn upsert_attendance(
        &self,
        student_id: &str,
        date: NaiveDate,
        record: &AttendanceRecord,
    ) -> Result<(), GatewayError> {
        let response = self
            .upsert_attendance_request(student_id, date, record)
            .send()?;
        Self::check_status(response)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AttendanceStatus;
    use reqwest::blocking::Request;

    fn gateway() -> RestGateway {
        RestGateway::new("https://abc.supabase.co", "anon-key").expect("client")
    }

    fn built(builder: RequestBuilder) -> Request {
        builder.build().expect("build request")
    }

    fn query(req: &Request) -> Vec<(String, String)> {
        req.url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn header<'a>(req: &'a Request, name: &str) -> Option<&'a str> {
        req.headers().get(name).and_then(|v| v.to_str().ok())
    }

    fn json_body(req: &Request) -> serde_json::Value {
        let bytes = req.body().and_then(|b| b.as_bytes()).expect("buffered body");
        serde_json::from_slice(bytes).expect("json body")
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn every_request_carries_key_headers() {
        let gw = gateway();
        let record = AttendanceRecord::default();
        let requests = vec![
            built(gw.list_students_request()),
            built(gw.insert_student_request("Asha")),
            built(gw.delete_student_request("s1")),
            built(gw.select_attendance_request("s1", ymd(2024, 3, 1), ymd(2024, 3, 31))),
            built(gw.upsert_attendance_request("s1", ymd(2024, 3, 6), &record)),
        ];
        for req in &requests {
            assert_eq!(header(req, "apikey"), Some("anon-key"), "{}", req.url());
            assert_eq!(header(req, "authorization"), Some("Bearer anon-key"));
            assert_eq!(header(req, "content-type"), Some("application/json"));
        }
    }

    #[test]
    fn upsert_posts_with_conflict_target_and_merge() {
        let gw = gateway();
        let record = AttendanceRecord {
            status: AttendanceStatus::Present,
            comment: "makeup class".into(),
        };
        let req = built(gw.upsert_attendance_request("s1", ymd(2024, 3, 6), &record));
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.url().path(), "/rest/v1/attendance");
        assert_eq!(
            query(&req),
            vec![("on_conflict".to_string(), "student_id,date".to_string())]
        );
        let prefer = header(&req, "prefer").expect("prefer header");
        assert!(prefer.contains("resolution=merge-duplicates"), "{prefer}");
        assert_eq!(
            json_body(&req),
            serde_json::json!([{
                "student_id": "s1",
                "date": "2024-03-06",
                "status": "present",
                "comment": "makeup class",
            }])
        );
    }

    #[test]
    fn insert_asks_for_the_created_row() {
        let req = built(gateway().insert_student_request("Asha"));
        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.url().path(), "/rest/v1/students");
        assert_eq!(header(&req, "prefer"), Some("return=representation"));
        assert_eq!(json_body(&req), serde_json::json!([{ "name": "Asha" }]));
    }

    #[test]
    fn delete_filters_by_id() {
        let req = built(gateway().delete_student_request("s-42"));
        assert_eq!(req.method(), &Method::DELETE);
        assert_eq!(req.url().path(), "/rest/v1/students");
        assert_eq!(query(&req), vec![("id".to_string(), "eq.s-42".to_string())]);
    }

    #[test]
    fn reads_order_their_rows() {
        let gw = gateway();
        let students = built(gw.list_students_request());
        assert_eq!(students.method(), &Method::GET);
        assert!(query(&students).contains(&("order".to_string(), "name.asc".to_string())));

        let month = built(gw.select_attendance_request("s1", ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(month.url().path(), "/rest/v1/attendance");
        let q = query(&month);
        assert!(q.contains(&("date".to_string(), "gte.2024-02-01".to_string())));
        assert!(q.contains(&("date".to_string(), "lte.2024-02-29".to_string())));
        assert!(q.contains(&("order".to_string(), "date.asc".to_string())));
    }

    #[test]
    fn rest_base_appends_rest_root_once() {
        assert_eq!(rest_base("https://abc.supabase.co"), "https://abc.supabase.co/rest/v1");
        assert_eq!(rest_base("https://abc.supabase.co/"), "https://abc.supabase.co/rest/v1");
        assert_eq!(
            rest_base("https://abc.supabase.co/rest/v1/"),
            "https://abc.supabase.co/rest/v1"
        );
    }

    #[test]
    fn table_url_joins_base() {
        let gw = RestGateway::new("http://localhost:54321", "anon").expect("client");
        assert_eq!(gw.table_url("students"), "http://localhost:54321/rest/v1/students");
    }

    #[test]
    fn range_query_filters_inclusive_bounds() {
        let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 3, 31).unwrap();
        let q = attendance_range_query("s1", first, last);
        assert!(q.contains(&("student_id", "eq.s1".to_string())));
        assert!(q.contains(&("date", "gte.2024-03-01".to_string())));
        assert!(q.contains(&("date", "lte.2024-03-31".to_string())));
    }

    #[test]
    fn wire_rows_accept_numeric_ids_and_null_comment() {
        let raw = serde_json::json!([
            { "id": 7, "student_id": 42, "date": "2024-03-05", "status": "absent", "comment": null }
        ]);
        let rows: Vec<AttendanceRowWire> = serde_json::from_value(raw).unwrap();
        let row = rows.into_iter().next().unwrap().into_row().unwrap();
        assert_eq!(row.student_id, "42");
        assert_eq!(row.record.status, AttendanceStatus::Absent);
        assert_eq!(row.record.comment, "");
    }

    #[test]
    fn wire_rows_reject_unknown_status() {
        let raw = serde_json::json!({ "student_id": "a", "date": "2024-03-05", "status": "late" });
        let row: AttendanceRowWire = serde_json::from_value(raw).unwrap();
        assert!(matches!(row.into_row(), Err(GatewayError::InvalidRow { .. })));
    }
}

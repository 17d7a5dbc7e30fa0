//! Form schema builders and the validator that runs them.
//!
//! A [`FormSchema`] is both a serializable description of the form and the
//! source of truth for validating submitted state: every rule declared on a
//! component is enforced by [`FormSchema::validate`], except uniqueness,
//! which needs the database and is reported through
//! [`FormSchema::unique_fields`].

use image::ImageFormat;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$",
    )
    .expect("email regex is valid")
});

/// Which page the form is being submitted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormContext {
    Create,
    Edit,
}

/// Read access to submitted form state, keyed by component name.
pub trait FormData {
    fn text(&self, field: &str) -> Option<&str>;
}

impl FormData for BTreeMap<String, String> {
    fn text(&self, field: &str) -> Option<&str> {
        self.get(field).map(String::as_str)
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Required {
    Never,
    Always,
    OnCreate,
}

impl Required {
    const fn applies(self, context: FormContext) -> bool {
        match self {
            Self::Never => false,
            Self::Always => true,
            Self::OnCreate => matches!(context, FormContext::Create),
        }
    }
}

/// When a component's state is handed to the model on save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dehydration {
    Always,
    WhenFilled,
    Never,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum Rule {
    String,
    MaxLength(usize),
    MinLength(usize),
    Email,
    Unique { ignore_record: bool },
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Email,
    Password,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextInput {
    pub name: String,
    pub label: String,
    pub input_type: InputType,
    pub required: Required,
    pub rules: Vec<Rule>,
    pub revealable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
    pub dehydration: Dehydration,
}

impl TextInput {
    #[must_use]
    pub fn make(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            input_type: InputType::Text,
            required: Required::Never,
            rules: Vec::new(),
            revealable: false,
            autocomplete: None,
            dehydration: Dehydration::Always,
        }
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Required::Always;
        self
    }

    #[must_use]
    pub fn required_on_create(mut self) -> Self {
        self.required = Required::OnCreate;
        self
    }

    #[must_use]
    pub fn string(self) -> Self {
        self.rule(Rule::String)
    }

    #[must_use]
    pub fn max_length(self, max: usize) -> Self {
        self.rule(Rule::MaxLength(max))
    }

    #[must_use]
    pub fn min_length(self, min: usize) -> Self {
        self.rule(Rule::MinLength(min))
    }

    #[must_use]
    pub fn email(mut self) -> Self {
        self.input_type = InputType::Email;
        self.rule(Rule::Email)
    }

    #[must_use]
    pub fn unique_ignoring_record(self) -> Self {
        self.rule(Rule::Unique {
            ignore_record: true,
        })
    }

    /// Requires a matching `<name>_confirmation` field.
    #[must_use]
    pub fn confirmed(self) -> Self {
        self.rule(Rule::Confirmed)
    }

    #[must_use]
    pub fn password(mut self) -> Self {
        self.input_type = InputType::Password;
        self
    }

    #[must_use]
    pub fn revealable(mut self) -> Self {
        self.revealable = true;
        self
    }

    #[must_use]
    pub fn autocomplete(mut self, value: &str) -> Self {
        self.autocomplete = Some(value.to_string());
        self
    }

    #[must_use]
    pub fn dehydrated_when_filled(mut self) -> Self {
        self.dehydration = Dehydration::WhenFilled;
        self
    }

    #[must_use]
    pub fn not_dehydrated(mut self) -> Self {
        self.dehydration = Dehydration::Never;
        self
    }

    fn rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    fn validate(
        &self,
        data: &dyn FormData,
        context: FormContext,
        errors: &mut ValidationErrors,
    ) {
        let attribute = validation_attribute(&self.label);
        let value = data.text(&self.name);

        if is_blank(value) {
            if self.required.applies(context) {
                errors.add(&self.name, format!("The {attribute} field is required."));
            }
            return;
        }

        let value = value.unwrap_or_default();
        let length = value.chars().count();

        for rule in &self.rules {
            match rule {
                Rule::String | Rule::Unique { .. } => {}
                Rule::MaxLength(max) if length > *max => errors.add(
                    &self.name,
                    format!("The {attribute} field must not be greater than {max} characters."),
                ),
                Rule::MinLength(min) if length < *min => errors.add(
                    &self.name,
                    format!("The {attribute} field must be at least {min} characters."),
                ),
                Rule::Email if !EMAIL_RE.is_match(value) => errors.add(
                    &self.name,
                    format!("The {attribute} field must be a valid email address."),
                ),
                Rule::Confirmed => {
                    let confirmation = data.text(&format!("{}_confirmation", self.name));
                    if confirmation != Some(value) {
                        errors.add(
                            &self.name,
                            format!("The {attribute} field confirmation does not match."),
                        );
                    }
                }
                _ => {}
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileUpload {
    pub name: String,
    pub label: String,
    pub nullable: bool,
    pub image: bool,
    pub directory: String,
    pub disk: String,
    pub openable: bool,
    /// Kilobytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    /// Deleting the uploaded file also clears the attribute on the record.
    pub delete_clears_record: bool,
}

impl FileUpload {
    #[must_use]
    pub fn make(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            nullable: false,
            image: false,
            directory: String::new(),
            disk: "public".to_string(),
            openable: false,
            max_size: None,
            delete_clears_record: false,
        }
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn image(mut self) -> Self {
        self.image = true;
        self
    }

    #[must_use]
    pub fn directory(mut self, directory: &str) -> Self {
        self.directory = directory.trim_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn disk(mut self, disk: &str) -> Self {
        self.disk = disk.to_string();
        self
    }

    #[must_use]
    pub fn openable(mut self) -> Self {
        self.openable = true;
        self
    }

    #[must_use]
    pub fn max_size(mut self, kilobytes: u64) -> Self {
        self.max_size = Some(kilobytes);
        self
    }

    #[must_use]
    pub fn delete_clears_record(mut self) -> Self {
        self.delete_clears_record = true;
        self
    }

    /// Checks an upload before it is written to the disk.
    pub fn check_upload(
        &self,
        filename: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<(), ValidationErrors> {
        let attribute = validation_attribute(&self.label);
        let mut errors = ValidationErrors::default();

        if self.image && !is_image_upload(filename, content_type, bytes) {
            errors.add(&self.name, format!("The {attribute} field must be an image."));
        }

        if let Some(max) = self.max_size
            && bytes.len() as u64 > max.saturating_mul(1024)
        {
            errors.add(
                &self.name,
                format!("The {attribute} field must not be greater than {max} kilobytes."),
            );
        }

        errors.into_result()
    }

    /// Stored path for an accepted upload.
    #[must_use]
    pub fn storage_path(&self, filename: &str) -> String {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_else(|| "bin".to_string());

        let stored = format!("{}.{}", uuid::Uuid::new_v4(), extension);
        if self.directory.is_empty() {
            stored
        } else {
            format!("{}/{}", self.directory, stored)
        }
    }

    fn validate(&self, data: &dyn FormData, errors: &mut ValidationErrors) {
        let attribute = validation_attribute(&self.label);
        let value = data.text(&self.name);

        if is_blank(value) {
            if !self.nullable {
                errors.add(&self.name, format!("The {attribute} field is required."));
            }
            return;
        }

        let value = value.unwrap_or_default();
        let in_directory = self.directory.is_empty()
            || value
                .strip_prefix(&self.directory)
                .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1);

        if !in_directory || value.contains("..") {
            errors.add(
                &self.name,
                format!("The {attribute} field must reference an uploaded file."),
            );
        } else if self.image && image_extension(value).is_none() {
            errors.add(&self.name, format!("The {attribute} field must be an image."));
        }
    }
}

/// Raster formats accepted by the `image` rule. SVG and ICO are not.
const IMAGE_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Bmp,
    ImageFormat::Gif,
    ImageFormat::WebP,
];

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Lowercased extension of `filename` if it names an accepted image type.
fn image_extension(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// The extension, the declared content type and the sniffed content must
/// all agree on one accepted format.
fn is_image_upload(filename: &str, content_type: Option<&str>, bytes: &[u8]) -> bool {
    let Some(extension) = image_extension(filename) else {
        return false;
    };

    let declared = content_type.is_none_or(|ct| {
        mime_guess::from_ext(&extension)
            .iter()
            .any(|m| m.essence_str().eq_ignore_ascii_case(ct.trim()))
    });

    declared
        && image::guess_format(bytes).is_ok_and(|format| {
            IMAGE_FORMATS.contains(&format) && format.extensions_str().contains(&extension.as_str())
        })
}

#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    pub name: String,
    pub title_attribute: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Select {
    pub name: String,
    pub label: String,
    pub nullable: bool,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    pub preload: bool,
    pub searchable: bool,
}

impl Select {
    #[must_use]
    pub fn make(name: &str) -> Self {
        Self {
            name: name.to_string(),
            label: name.to_string(),
            nullable: false,
            multiple: false,
            relationship: None,
            preload: false,
            searchable: false,
        }
    }

    #[must_use]
    pub fn label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    #[must_use]
    pub fn relationship(mut self, name: &str, title_attribute: &str) -> Self {
        self.relationship = Some(Relationship {
            name: name.to_string(),
            title_attribute: title_attribute.to_string(),
        });
        self
    }

    #[must_use]
    pub fn preload(mut self) -> Self {
        self.preload = true;
        self
    }

    #[must_use]
    pub fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Grid {
    pub columns: u8,
    pub schema: Vec<Component>,
}

impl Grid {
    #[must_use]
    pub const fn make(columns: u8) -> Self {
        Self {
            columns,
            schema: Vec::new(),
        }
    }

    #[must_use]
    pub fn schema(mut self, schema: Vec<Component>) -> Self {
        self.schema = schema;
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    TextInput(TextInput),
    FileUpload(FileUpload),
    Select(Select),
    Grid(Grid),
}

impl Component {
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::TextInput(c) => Some(&c.name),
            Self::FileUpload(c) => Some(&c.name),
            Self::Select(c) => Some(&c.name),
            Self::Grid(_) => None,
        }
    }

    fn collect_fields<'a>(&'a self, out: &mut Vec<&'a Component>) {
        match self {
            Self::Grid(grid) => grid.schema.iter().for_each(|c| c.collect_fields(out)),
            field => out.push(field),
        }
    }
}

impl From<TextInput> for Component {
    fn from(c: TextInput) -> Self {
        Self::TextInput(c)
    }
}

impl From<FileUpload> for Component {
    fn from(c: FileUpload) -> Self {
        Self::FileUpload(c)
    }
}

impl From<Select> for Component {
    fn from(c: Select) -> Self {
        Self::Select(c)
    }
}

impl From<Grid> for Component {
    fn from(c: Grid) -> Self {
        Self::Grid(c)
    }
}

fn find_file_upload_mut<'a>(
    components: &'a mut [Component],
    name: &str,
) -> Option<&'a mut FileUpload> {
    components.iter_mut().find_map(|component| match component {
        Component::FileUpload(upload) if upload.name == name => Some(upload),
        Component::Grid(grid) => find_file_upload_mut(&mut grid.schema, name),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FormSchema {
    pub schema: Vec<Component>,
}

impl FormSchema {
    #[must_use]
    pub fn schema(schema: Vec<Component>) -> Self {
        Self { schema }
    }

    /// Leaf components in declaration order, with grids flattened.
    #[must_use]
    pub fn fields(&self) -> Vec<&Component> {
        let mut out = Vec::new();
        self.schema.iter().for_each(|c| c.collect_fields(&mut out));
        out
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Component> {
        self.fields().into_iter().find(|c| c.name() == Some(name))
    }

    #[must_use]
    pub fn file_upload(&self, name: &str) -> Option<&FileUpload> {
        match self.field(name) {
            Some(Component::FileUpload(upload)) => Some(upload),
            _ => None,
        }
    }

    pub fn file_upload_mut(&mut self, name: &str) -> Option<&mut FileUpload> {
        find_file_upload_mut(&mut self.schema, name)
    }

    /// Fields carrying a uniqueness rule, with whether the current record
    /// is excluded from the check.
    #[must_use]
    pub fn unique_fields(&self) -> Vec<(&str, &str, bool)> {
        self.fields()
            .into_iter()
            .filter_map(|c| match c {
                Component::TextInput(input) => input.rules.iter().find_map(|r| match r {
                    Rule::Unique { ignore_record } => {
                        Some((input.name.as_str(), input.label.as_str(), *ignore_record))
                    }
                    _ => None,
                }),
                _ => None,
            })
            .collect()
    }

    /// Whether a field's submitted state is persisted.
    #[must_use]
    pub fn dehydrates(&self, name: &str, value: Option<&str>) -> bool {
        match self.field(name) {
            Some(Component::TextInput(input)) => match input.dehydration {
                Dehydration::Always => true,
                Dehydration::WhenFilled => !is_blank(value),
                Dehydration::Never => false,
            },
            Some(_) => true,
            None => false,
        }
    }

    pub fn validate(
        &self,
        data: &dyn FormData,
        context: FormContext,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        for field in self.fields() {
            match field {
                Component::TextInput(input) => input.validate(data, context, &mut errors),
                Component::FileUpload(upload) => upload.validate(data, &mut errors),
                Component::Select(_) | Component::Grid(_) => {}
            }
        }

        errors.into_result()
    }
}

/// Attribute name used in messages: the label with a lowercased first letter.
#[must_use]
pub fn validation_attribute(label: &str) -> String {
    let mut chars = label.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_lowercase().chain(chars).collect()
    })
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    #[must_use]
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let first = self.0.values().flatten().next();
        match (first, self.0.values().map(Vec::len).sum::<usize>()) {
            (Some(message), 1) => write!(f, "{message}"),
            (Some(message), n) => write!(f, "{message} (and {} more errors)", n - 1),
            (None, _) => write!(f, "no validation errors"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn schema() -> FormSchema {
        FormSchema::schema(vec![
            FileUpload::make("avatar")
                .label("Avatar")
                .nullable()
                .image()
                .directory("avatars")
                .max_size(2048)
                .into(),
            Grid::make(2)
                .schema(vec![
                    TextInput::make("name")
                        .label("Name")
                        .required()
                        .max_length(10)
                        .into(),
                    TextInput::make("email")
                        .label("Email")
                        .required()
                        .email()
                        .unique_ignoring_record()
                        .into(),
                    TextInput::make("password")
                        .label("Password")
                        .required_on_create()
                        .min_length(6)
                        .confirmed()
                        .dehydrated_when_filled()
                        .into(),
                ])
                .into(),
        ])
    }

    #[test]
    fn test_fields_flatten_grids() {
        let schema = schema();
        let names: Vec<_> = schema.fields().iter().filter_map(|c| c.name()).collect();
        assert_eq!(names, vec!["avatar", "name", "email", "password"]);
    }

    #[test]
    fn test_required_depends_on_context() {
        let form = schema();
        let input = data(&[("name", "Ann"), ("email", "ann@example.com")]);

        let errors = form.validate(&input, FormContext::Create).unwrap_err();
        assert_eq!(errors.get("password"), ["The password field is required."]);

        assert!(form.validate(&input, FormContext::Edit).is_ok());
    }

    #[test]
    fn test_length_and_email_rules() {
        let form = schema();
        let input = data(&[("name", "A very long name"), ("email", "not-an-email")]);

        let errors = form.validate(&input, FormContext::Edit).unwrap_err();
        assert_eq!(
            errors.get("name"),
            ["The name field must not be greater than 10 characters."]
        );
        assert_eq!(
            errors.get("email"),
            ["The email field must be a valid email address."]
        );
    }

    #[test]
    fn test_max_length_counts_characters() {
        let form = schema();
        let input = data(&[("name", "ÄÖÜäöüßéèà"), ("email", "a@b.io")]);
        assert!(form.validate(&input, FormContext::Edit).is_ok());
    }

    #[test]
    fn test_confirmation_must_match() {
        let form = schema();
        let input = data(&[
            ("name", "Ann"),
            ("email", "ann@example.com"),
            ("password", "secret1"),
            ("password_confirmation", "secret2"),
        ]);

        let errors = form.validate(&input, FormContext::Create).unwrap_err();
        assert_eq!(
            errors.get("password"),
            ["The password field confirmation does not match."]
        );

        let input = data(&[
            ("name", "Ann"),
            ("email", "ann@example.com"),
            ("password", "secret1"),
            ("password_confirmation", "secret1"),
        ]);
        assert!(form.validate(&input, FormContext::Create).is_ok());
    }

    #[test]
    fn test_blank_optional_field_skips_rules() {
        let form = schema();
        let input = data(&[
            ("name", "Ann"),
            ("email", "ann@example.com"),
            ("password", ""),
        ]);
        assert!(form.validate(&input, FormContext::Edit).is_ok());
    }

    #[test]
    fn test_dehydration() {
        let form = schema();
        assert!(!form.dehydrates("password", Some("")));
        assert!(!form.dehydrates("password", None));
        assert!(form.dehydrates("password", Some("secret1")));
        assert!(form.dehydrates("name", Some("")));
        assert!(!form.dehydrates("unknown", Some("x")));
    }

    #[test]
    fn test_unique_fields() {
        assert_eq!(schema().unique_fields(), vec![("email", "Email", true)]);
    }

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_file_upload_rules() {
        let form = schema();
        let upload = form.file_upload("avatar").unwrap();

        assert!(upload.check_upload("me.png", Some("image/png"), PNG_MAGIC).is_ok());
        assert!(upload.check_upload("me.png", None, PNG_MAGIC).is_ok());
        assert!(upload.check_upload("me.txt", Some("text/plain"), b"hello").is_err());
        assert!(upload.check_upload("me.png", Some("application/pdf"), PNG_MAGIC).is_err());

        let mut big = PNG_MAGIC.to_vec();
        big.resize(2048 * 1024 + 1, 0);
        let errors = upload
            .check_upload("me.png", Some("image/png"), &big)
            .unwrap_err();
        assert_eq!(
            errors.get("avatar"),
            ["The avatar field must not be greater than 2048 kilobytes."]
        );

        let path = upload.storage_path("Me.PNG");
        assert!(path.starts_with("avatars/"));
        assert!(path.ends_with(".png"));
    }

    #[test]
    fn test_image_rule_refuses_vector_and_disguised_files() {
        let form = schema();
        let upload = form.file_upload("avatar").unwrap();
        let svg = b"<svg xmlns=\"http://www.w3.org/2000/svg\"><script>alert(1)</script></svg>";
        let html = b"<html><script>alert(1)</script></html>";
        let ico = b"\0\0\x01\0\x01\0\x10\x10\0\0\x01\0\x20\0";

        assert!(upload.check_upload("x.svg", Some("image/svg+xml"), svg).is_err());
        assert!(upload.check_upload("x.ico", Some("image/x-icon"), ico).is_err());
        assert!(upload.check_upload("x.png", Some("image/png"), html).is_err());
        assert!(upload.check_upload("x.png", Some("image/png"), svg).is_err());
        // PNG bytes under a GIF name
        assert!(upload.check_upload("x.gif", Some("image/gif"), PNG_MAGIC).is_err());
        assert!(upload.check_upload("x.gif", Some("image/gif"), b"GIF89a\x01\0\x01\0").is_ok());
        assert!(upload.check_upload("x.jpg", Some("image/jpeg"), b"\xff\xd8\xff\xe0\0\x10JFIF").is_ok());
    }

    #[test]
    fn test_file_upload_state_must_point_into_directory() {
        let form = schema();
        let base = [("name", "Ann"), ("email", "ann@example.com")];

        let mut input = data(&base);
        input.insert("avatar".into(), "avatars/abc.png".into());
        assert!(form.validate(&input, FormContext::Edit).is_ok());

        input.insert("avatar".into(), "elsewhere/abc.png".into());
        assert!(form.validate(&input, FormContext::Edit).unwrap_err().has("avatar"));

        input.insert("avatar".into(), "avatars/../secret.png".into());
        assert!(form.validate(&input, FormContext::Edit).unwrap_err().has("avatar"));

        input.insert("avatar".into(), "avatars/abc.svg".into());
        assert!(form.validate(&input, FormContext::Edit).unwrap_err().has("avatar"));
    }

    #[test]
    fn test_validation_attribute() {
        assert_eq!(validation_attribute("Confirm Password"), "confirm Password");
        assert_eq!(validation_attribute(""), "");
    }

    #[test]
    fn test_schema_serializes_component_types() {
        let json = serde_json::to_value(schema()).unwrap();
        assert_eq!(json["schema"][0]["type"], "file_upload");
        assert_eq!(json["schema"][1]["type"], "grid");
        assert_eq!(json["schema"][1]["schema"][0]["required"], "always");
        assert_eq!(json["schema"][1]["schema"][2]["required"], "on_create");
        assert_eq!(json["schema"][1]["schema"][2]["dehydration"], "when_filled");
    }
}

use chrono::NaiveDate;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Integer { min: i64, max: i64 },
    Decimal { min: f64, max: f64 },
    Date { min: NaiveDate, max: NaiveDate },
    Choice(&'static [&'static str]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub value: String,
}

impl Field {
    pub fn text(key: &'static str, label: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Text,
            required: false,
            value: value.into(),
        }
    }

    pub fn integer(key: &'static str, label: &'static str, min: i64, max: i64, value: i64) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Integer { min, max },
            required: true,
            value: value.to_string(),
        }
    }

    pub fn decimal(key: &'static str, label: &'static str, min: f64, max: f64, value: f64) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Decimal { min, max },
            required: true,
            value: format!("{value:.1}"),
        }
    }

    pub fn date(
        key: &'static str,
        label: &'static str,
        min: NaiveDate,
        max: NaiveDate,
        value: NaiveDate,
    ) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Date { min, max },
            required: true,
            value: value.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn choice(key: &'static str, label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            key,
            label,
            kind: FieldKind::Choice(options),
            required: true,
            value: options.first().copied().unwrap_or_default().to_string(),
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn accepts(&self, ch: char) -> bool {
        match self.kind {
            FieldKind::Text => !ch.is_control(),
            FieldKind::Integer { min, .. } => ch.is_ascii_digit() || (ch == '-' && min < 0),
            FieldKind::Decimal { .. } => ch.is_ascii_digit() || ch == '.' || ch == ',',
            FieldKind::Date { .. } => ch.is_ascii_digit() || ch == '-',
            FieldKind::Choice(_) => false,
        }
    }

    fn cycle(&mut self, step: isize) {
        let FieldKind::Choice(options) = self.kind else {
            return;
        };
        if options.is_empty() {
            return;
        }
        let current = options.iter().position(|o| *o == self.value).unwrap_or(0) as isize;
        let len = options.len() as isize;
        let next = (current + step).rem_euclid(len) as usize;
        self.value = options[next].to_string();
    }

    /// Trimmed value, or `None` when blank.
    pub fn trimmed(&self) -> Option<&str> {
        let v = self.value.trim();
        if v.is_empty() { None } else { Some(v) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub title: &'static str,
    pub fields: Vec<Field>,
    pub focus: usize,
}

impl Form {
    pub fn new(title: &'static str, fields: Vec<Field>) -> Self {
        Self {
            title,
            fields,
            focus: 0,
        }
    }

    pub fn focused(&self) -> Option<&Field> {
        self.fields.get(self.focus)
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
        }
    }

    pub fn input(&mut self, ch: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if field.accepts(ch) {
                field.value.push(ch);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if !matches!(field.kind, FieldKind::Choice(_)) {
                field.value.pop();
            }
        }
    }

    pub fn cycle_choice(&mut self, step: isize) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.cycle(step);
        }
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        if let Some(field) = self.fields.iter_mut().find(|f| f.key == key) {
            field.value = value.into();
        }
    }

    pub fn raw(&self, key: &str) -> &str {
        self.field(key).map(|f| f.value.as_str()).unwrap_or_default()
    }

    fn require_field(&self, key: &'static str) -> Result<&Field, ValidationError> {
        self.field(key)
            .ok_or_else(|| ValidationError::new(key, "missing from form"))
    }

    /// Text value; blank is an error for required fields and `None` otherwise.
    pub fn text(&self, key: &'static str) -> Result<Option<String>, ValidationError> {
        let field = self.require_field(key)?;
        match field.trimmed() {
            Some(v) => Ok(Some(v.to_string())),
            None if field.required => Err(ValidationError::new(
                field.label,
                "is required",
            )),
            None => Ok(None),
        }
    }

    pub fn required_text(&self, key: &'static str) -> Result<String, ValidationError> {
        let field = self.require_field(key)?;
        field
            .trimmed()
            .map(str::to_string)
            .ok_or_else(|| ValidationError::new(field.label, "is required"))
    }

    pub fn integer(&self, key: &'static str) -> Result<i64, ValidationError> {
        let field = self.require_field(key)?;
        let raw = field
            .trimmed()
            .ok_or_else(|| ValidationError::new(field.label, "is required"))?;
        let n = raw
            .parse::<i64>()
            .map_err(|_| ValidationError::new(field.label, format!("{raw:?} is not a whole number")))?;
        if let FieldKind::Integer { min, max } = field.kind {
            if n < min || n > max {
                return Err(ValidationError::new(
                    field.label,
                    format!("must be between {min} and {max}"),
                ));
            }
        }
        Ok(n)
    }

    pub fn decimal(&self, key: &'static str) -> Result<f64, ValidationError> {
        let field = self.require_field(key)?;
        let raw = field
            .trimmed()
            .ok_or_else(|| ValidationError::new(field.label, "is required"))?;
        let n = raw
            .replace(',', ".")
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .ok_or_else(|| ValidationError::new(field.label, format!("{raw:?} is not a number")))?;
        if let FieldKind::Decimal { min, max } = field.kind {
            if n < min || n > max {
                return Err(ValidationError::new(
                    field.label,
                    format!("must be between {min:.1} and {max:.1}"),
                ));
            }
        }
        Ok(n)
    }

    pub fn date(&self, key: &'static str) -> Result<NaiveDate, ValidationError> {
        let field = self.require_field(key)?;
        let raw = field
            .trimmed()
            .ok_or_else(|| ValidationError::new(field.label, "is required"))?;
        let d = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|_| ValidationError::new(field.label, "must be a date as YYYY-MM-DD"))?;
        if let FieldKind::Date { min, max } = field.kind {
            if d < min || d > max {
                return Err(ValidationError::new(
                    field.label,
                    format!("must be between {min} and {max}"),
                ));
            }
        }
        Ok(d)
    }

    pub fn choice(&self, key: &'static str) -> Result<&str, ValidationError> {
        let field = self.require_field(key)?;
        match field.kind {
            FieldKind::Choice(options) if options.contains(&field.value.as_str()) => {
                Ok(field.value.as_str())
            }
            FieldKind::Choice(_) => Err(ValidationError::new(field.label, "pick one of the options")),
            _ => Ok(field.value.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Form {
        Form::new(
            "Sample",
            vec![
                Field::text("name", "Name", "").required(),
                Field::integer("minutes", "Minutes", 1, 120, 90),
                Field::choice("foot", "Foot", &["Right", "Left", "Both"]),
                Field::decimal("rating", "Rating", 0.0, 10.0, 7.5),
            ],
        )
    }

    #[test]
    fn focus_wraps_both_ways() {
        let mut form = sample();
        form.focus_prev();
        assert_eq!(form.focus, 3);
        form.focus_next();
        assert_eq!(form.focus, 0);
    }

    #[test]
    fn integer_fields_ignore_letters() {
        let mut form = sample();
        form.focus = 1;
        form.backspace();
        form.backspace();
        form.input('x');
        form.input('4');
        form.input('5');
        assert_eq!(form.raw("minutes"), "45");
        assert_eq!(form.integer("minutes"), Ok(45));
    }

    #[test]
    fn range_is_enforced() {
        let mut form = sample();
        form.set("minutes", "0");
        let err = form.integer("minutes").unwrap_err();
        assert_eq!(err.field, "Minutes");
        form.set("minutes", "121");
        assert!(form.integer("minutes").is_err());
    }

    #[test]
    fn choice_cycles_and_wraps() {
        let mut form = sample();
        form.focus = 2;
        form.cycle_choice(-1);
        assert_eq!(form.raw("foot"), "Both");
        form.cycle_choice(1);
        assert_eq!(form.raw("foot"), "Right");
        form.backspace();
        assert_eq!(form.choice("foot"), Ok("Right"));
    }

    #[test]
    fn required_blank_text_is_rejected() {
        let mut form = sample();
        form.set("name", "   ");
        assert!(form.required_text("name").is_err());
        assert!(form.text("name").is_err());
    }

    #[test]
    fn decimal_accepts_comma() {
        let mut form = sample();
        form.set("rating", "6,5");
        assert_eq!(form.decimal("rating"), Ok(6.5));
        form.set("rating", "10.1");
        assert!(form.decimal("rating").is_err());
    }

    #[test]
    fn dates_are_checked_against_bounds() {
        let min = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        let max = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        let mut form = Form::new(
            "Dates",
            vec![Field::date("born", "Birth date", min, max, min)],
        );
        form.set("born", "1969-12-31");
        assert!(form.date("born").is_err());
        form.set("born", "2005-01-01");
        assert_eq!(form.date("born"), Ok(NaiveDate::from_ymd_opt(2005, 1, 1).unwrap()));
        form.set("born", "01/01/2005");
        assert!(form.date("born").is_err());
    }
}

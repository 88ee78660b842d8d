//! Path templates, route matching and handler signatures
//!
//! A template such as `/users/{userId}/name` is compiled once into alternating
//! literal and parameter segments. Matching scans the request path: each
//! literal must appear where the template puts it, and each parameter takes
//! everything up to the next literal (or to the end of the path).

use crate::{
    errors::{Error, Result},
    http::{
        body::Body,
        request::{Request, Uri},
        types::Method,
    },
};
use std::fmt;

// TEMPLATE

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Parameter(String),
}

/// A compiled path template.
///
/// # Examples
/// ```
/// use resource_http::resource::{PathMatch, PathTemplate};
///
/// let template = PathTemplate::compile("/users/{userId}/name")?;
/// assert_eq!(template.parameter_names().collect::<Vec<_>>(), ["userId"]);
///
/// let PathMatch::Matched(parameters) = template.match_path("/users/42/name", true) else {
///     panic!("expected a match");
/// };
/// assert_eq!(parameters[0].value, "42");
///
/// assert_eq!(template.match_path("/users/42/name/extra", true), PathMatch::Unmatched);
/// # Ok::<(), resource_http::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

/// The outcome of matching one path against one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathMatch {
    /// The path does not have the template's shape.
    Unmatched,
    /// The shape fits but a parameter would be empty.
    Rejected,
    /// Parameters in template order.
    Matched(Vec<RawPathParameter>),
}

impl PathTemplate {
    /// # Errors
    ///
    /// [`Error::InvalidAction`] for an unbalanced or nested brace, an empty
    /// parameter name, or two parameters with no literal between them.
    pub fn compile(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::invalid_action(format!("{reason}: {raw}"));

        let mut segments = Vec::new();
        let mut rest = raw;

        while !rest.is_empty() {
            match rest.find(['{', '}']) {
                None => {
                    segments.push(Segment::Literal(rest.to_string()));
                    rest = "";
                }
                Some(open) if rest.as_bytes()[open] == b'{' => {
                    if open > 0 {
                        segments.push(Segment::Literal(rest[..open].to_string()));
                    } else if matches!(segments.last(), Some(Segment::Parameter(_))) {
                        return Err(invalid("URI template has adjacent parameters"));
                    }

                    let after = &rest[open + 1..];
                    let close = after
                        .find(['{', '}'])
                        .filter(|&i| after.as_bytes()[i] == b'}')
                        .ok_or_else(|| invalid("URI template has unbalanced brace"))?;

                    let name = after[..close].trim();
                    if name.is_empty() {
                        return Err(invalid("URI template has an unnamed parameter"));
                    }

                    segments.push(Segment::Parameter(name.to_string()));
                    rest = &after[close + 1..];
                }
                Some(_) => return Err(invalid("URI template has unbalanced brace")),
            }
        }

        Ok(PathTemplate {
            raw: raw.to_string(),
            segments,
        })
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn parameter_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Parameter(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    pub fn parameter_count(&self) -> usize {
        self.parameter_names().count()
    }

    /// Matches `path`, which must not carry a query string.
    ///
    /// The last parameter may end with one `/` but never contain another.
    /// Inner parameters may contain `/` only when
    /// `disallow_path_parameters_with_slash` is `false`; otherwise a short
    /// template could swallow the path of a longer, more specific one.
    pub fn match_path(&self, path: &str, disallow_path_parameters_with_slash: bool) -> PathMatch {
        let mut cursor = 0;
        let mut parameters = Vec::with_capacity(self.segments.len() / 2 + 1);
        let mut segments = self.segments.iter().peekable();

        if let Some(Segment::Literal(prefix)) = segments.peek() {
            if !path.starts_with(prefix.as_str()) {
                return PathMatch::Unmatched;
            }
            cursor = prefix.len();
            segments.next();
        }

        while let Some(segment) = segments.next() {
            let Segment::Parameter(name) = segment else {
                continue;
            };

            let value = match segments.next() {
                Some(Segment::Literal(literal)) => {
                    let Some(index) = path[cursor..].find(literal.as_str()) else {
                        return PathMatch::Unmatched;
                    };
                    let value = &path[cursor..cursor + index];
                    cursor += index + literal.len();

                    if disallow_path_parameters_with_slash && value.contains('/') {
                        return PathMatch::Unmatched;
                    }
                    value
                }
                _ => {
                    let value = &path[cursor..];
                    cursor = path.len();

                    if value.strip_suffix('/').unwrap_or(value).contains('/') {
                        return PathMatch::Unmatched;
                    }
                    value
                }
            };

            if value.is_empty() {
                return PathMatch::Rejected;
            }

            parameters.push(RawPathParameter::new(name.as_str(), value));
        }

        match &path[cursor..] {
            "" | "/" => PathMatch::Matched(parameters),
            _ => PathMatch::Unmatched,
        }
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A path parameter as it appeared in the URI, undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPathParameter {
    pub name: String,
    pub value: String,
}

impl RawPathParameter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        RawPathParameter {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn named<'a>(name: &str, parameters: &'a [RawPathParameter]) -> Option<&'a RawPathParameter> {
        parameters.iter().find(|parameter| parameter.name == name)
    }
}

// SIGNATURE

/// One declared handler parameter, e.g. `String userId` or `body:Name name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub type_name: String,
    pub name: String,
    pub body: bool,
}

/// A parsed handler signature such as `changeName(String userId, body:Name name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToSpec {
    method_name: String,
    parameters: Vec<MethodParameter>,
}

impl ToSpec {
    /// # Errors
    ///
    /// [`Error::InvalidAction`] when parentheses or the method name are
    /// missing, a parameter has no type or name, or a non-body parameter has
    /// a type that cannot be read from a path.
    ///
    /// # Examples
    /// ```
    /// use resource_http::resource::ToSpec;
    ///
    /// let to = ToSpec::parse("changeName(String userId, body:Name name)")?;
    /// assert_eq!(to.method_name(), "changeName");
    /// assert_eq!(to.parameters().len(), 2);
    /// assert!(to.body().is_some_and(|p| p.name == "name"));
    /// assert_eq!(to.signature(), "changeName(String userId, Name name)");
    /// # Ok::<(), resource_http::Error>(())
    /// ```
    pub fn parse(to: &str) -> Result<Self> {
        let invalid = || Error::invalid_action(format!("Invalid to declaration: {to}"));

        let (Some(open), Some(close)) = (to.find('('), to.rfind(')')) else {
            return Err(invalid());
        };
        if close < open {
            return Err(invalid());
        }

        let method_name = to[..open].trim();
        if method_name.is_empty() {
            return Err(invalid());
        }

        let mut parameters = Vec::new();
        for raw in to[open + 1..close].split(',').map(str::trim) {
            if raw.is_empty() {
                continue;
            }

            let (body, declaration) = match raw.strip_prefix("body:") {
                Some(declaration) => (true, declaration.trim()),
                None => (false, raw),
            };

            let Some((type_name, name)) = declaration.rsplit_once(' ') else {
                return Err(Error::invalid_action(format!(
                    "Parameter type and name must be separated by space: {raw}"
                )));
            };
            let (type_name, name) = (type_name.trim(), name.trim());

            if type_name.is_empty() || name.is_empty() {
                return Err(invalid());
            }
            if !body && ParameterType::of(type_name).is_none() {
                return Err(Error::invalid_action(format!("Unsupported parameter type: {raw}")));
            }

            parameters.push(MethodParameter {
                type_name: type_name.to_string(),
                name: name.to_string(),
                body,
            });
        }

        Ok(ToSpec {
            method_name: method_name.to_string(),
            parameters,
        })
    }

    #[inline]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    #[inline]
    pub fn parameters(&self) -> &[MethodParameter] {
        &self.parameters
    }

    pub fn body(&self) -> Option<&MethodParameter> {
        self.parameters.iter().find(|parameter| parameter.body)
    }

    pub fn parameter_of(&self, name: &str) -> Option<&MethodParameter> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    /// `name(Type a, Type b)`, without `body:` markers.
    pub fn signature(&self) -> String {
        let parameters: Vec<_> = self
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.type_name, p.name))
            .collect();

        format!("{}({})", self.method_name, parameters.join(", "))
    }
}

impl fmt::Display for ToSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParameterType {
    String,
    Int,
    Long,
    Boolean,
    Double,
    Float,
    Short,
    Byte,
    Char,
}

impl ParameterType {
    fn of(type_name: &str) -> Option<Self> {
        Some(match type_name {
            "String" => ParameterType::String,
            "int" | "Integer" => ParameterType::Int,
            "long" | "Long" => ParameterType::Long,
            "boolean" | "Boolean" => ParameterType::Boolean,
            "double" | "Double" => ParameterType::Double,
            "float" | "Float" => ParameterType::Float,
            "short" | "Short" => ParameterType::Short,
            "byte" | "Byte" => ParameterType::Byte,
            "char" | "Character" => ParameterType::Char,
            _ => return None,
        })
    }

    fn read(self, raw: &str) -> Result<ParameterValue> {
        fn parse<T: std::str::FromStr>(raw: &str) -> Result<T> {
            raw.parse()
                .map_err(|_| Error::bad_request(format!("Path parameter has the wrong type: {raw}")))
        }

        Ok(match self {
            ParameterType::String => ParameterValue::String(raw.to_string()),
            ParameterType::Int => ParameterValue::Int(parse(raw)?),
            ParameterType::Long => ParameterValue::Long(parse(raw)?),
            // anything but `true` reads as false
            ParameterType::Boolean => ParameterValue::Boolean(raw.eq_ignore_ascii_case("true")),
            ParameterType::Double => ParameterValue::Double(parse(raw)?),
            ParameterType::Float => ParameterValue::Float(parse(raw)?),
            ParameterType::Short => ParameterValue::Short(parse(raw)?),
            ParameterType::Byte => ParameterValue::Byte(parse(raw)?),
            ParameterType::Char => ParameterValue::Char(
                raw.chars()
                    .next()
                    .ok_or_else(|| Error::bad_request("Path parameter is empty"))?,
            ),
        })
    }
}

// MAPPED PARAMETERS

/// A handler argument converted from its path text or taken from the request.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    String(String),
    Int(i32),
    Long(i64),
    Boolean(bool),
    Double(f64),
    Float(f32),
    Short(i16),
    Byte(i8),
    Char(char),
    Body(Body),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedParameter {
    pub name: String,
    pub type_name: String,
    pub value: ParameterValue,
}

/// Everything a [`DynamicHandler`](crate::resource::DynamicHandler) needs to
/// invoke the method an action names.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedParameters {
    pub action_id: usize,
    pub http_method: Method,
    pub method_name: String,
    pub mapped: Vec<MappedParameter>,
}

impl MappedParameters {
    pub fn value_of(&self, name: &str) -> Option<&ParameterValue> {
        self.mapped
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| &parameter.value)
    }

    /// The value at `position`, in signature order.
    pub fn get(&self, position: usize) -> Option<&ParameterValue> {
        self.mapped.get(position).map(|parameter| &parameter.value)
    }

    /// Text of a `String` parameter.
    pub fn string_of(&self, name: &str) -> Result<&str> {
        match self.value_of(name) {
            Some(ParameterValue::String(value)) => Ok(value),
            other => Err(self.mismatch(name, "String", other)),
        }
    }

    /// Any integral parameter widened to `i64`.
    pub fn integer_of(&self, name: &str) -> Result<i64> {
        match self.value_of(name) {
            Some(ParameterValue::Int(value)) => Ok(i64::from(*value)),
            Some(ParameterValue::Long(value)) => Ok(*value),
            Some(ParameterValue::Short(value)) => Ok(i64::from(*value)),
            Some(ParameterValue::Byte(value)) => Ok(i64::from(*value)),
            other => Err(self.mismatch(name, "integer", other)),
        }
    }

    pub fn body(&self) -> Option<&Body> {
        self.mapped.iter().find_map(|parameter| match &parameter.value {
            ParameterValue::Body(body) => Some(body),
            _ => None,
        })
    }

    /// The error a handler returns for a method name it does not implement.
    pub fn handler_missing(&self) -> Error {
        Error::HandlerMissing(format!(
            "No handler for {} in action {}",
            self.method_name, self.action_id
        ))
    }

    fn mismatch(&self, name: &str, expected: &str, found: Option<&ParameterValue>) -> Error {
        Error::HandlerFailure(format!(
            "Parameter {name} of {} is not a {expected}: {found:?}",
            self.method_name
        ))
    }
}

// ACTION

/// A route declared by id, method, path template and handler signature.
///
/// # Examples
/// ```
/// use resource_http::{resource::Action, Method, Uri};
///
/// let action = Action::new(0, "GET", "/users/{userId}", "queryUser(String userId)")?;
/// let results = action.match_with(Method::Get, &Uri::from("/users/1234567?x=1"));
///
/// assert!(results.is_matched());
/// assert_eq!(results.parameters()[0].value, "1234567");
/// # Ok::<(), resource_http::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Action {
    id: usize,
    method: Method,
    template: PathTemplate,
    to: ToSpec,
    disallow_path_parameters_with_slash: bool,
}

impl Action {
    /// # Errors
    ///
    /// [`Error::InvalidAction`] for an unknown method, a bad template or a bad
    /// signature.
    pub fn new(id: usize, method: &str, uri: &str, to: &str) -> Result<Self> {
        let method = Method::from_token(method)
            .map_err(|_| Error::invalid_action(format!("Unknown method: {method}")))?;

        Ok(Action {
            id,
            method,
            template: PathTemplate::compile(uri)?,
            to: ToSpec::parse(to)?,
            disallow_path_parameters_with_slash: true,
        })
    }

    /// Allows or forbids inner path parameters that contain `/` (forbidden by default).
    pub fn disallow_path_parameters_with_slash(mut self, disallow: bool) -> Self {
        self.disallow_path_parameters_with_slash = disallow;
        self
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    pub fn method(&self) -> Method {
        self.method
    }

    #[inline]
    pub fn uri(&self) -> &str {
        self.template.as_str()
    }

    #[inline]
    pub fn to(&self) -> &ToSpec {
        &self.to
    }

    pub fn match_with(&self, method: Method, uri: &Uri) -> MatchResults<'_> {
        if self.method != method {
            return MatchResults::unmatched();
        }

        match self
            .template
            .match_path(uri.path(), self.disallow_path_parameters_with_slash)
        {
            PathMatch::Unmatched => MatchResults::unmatched(),
            PathMatch::Rejected => MatchResults {
                action: Some(self),
                parameters: Vec::new(),
                matched: false,
            },
            PathMatch::Matched(parameters) => MatchResults {
                action: Some(self),
                parameters,
                matched: true,
            },
        }
    }

    /// Converts matched path parameters to the types the signature declares,
    /// in signature order; the body parameter receives the request body.
    ///
    /// # Errors
    ///
    /// [`Error::BadRequest`] when a path value does not parse as its type.
    pub fn map(&self, request: &Request, parameters: &[RawPathParameter]) -> Result<MappedParameters> {
        let mut mapped = Vec::with_capacity(self.to.parameters.len());

        for typed in &self.to.parameters {
            let value = if typed.body {
                ParameterValue::Body(request.body().clone())
            } else {
                let Some(raw) = RawPathParameter::named(&typed.name, parameters) else {
                    break;
                };
                ParameterType::of(&typed.type_name)
                    .ok_or_else(|| Error::invalid_action(format!("Unsupported parameter type: {}", typed.type_name)))?
                    .read(&raw.value)?
            };

            mapped.push(MappedParameter {
                name: typed.name.clone(),
                type_name: typed.type_name.clone(),
                value,
            });
        }

        Ok(MappedParameters {
            action_id: self.id,
            http_method: self.method,
            method_name: self.to.method_name.clone(),
            mapped,
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.template, self.to)
    }
}

/// The outcome of [`Action::match_with`].
///
/// `action` is set when the method and path shape fit, even if a parameter
/// turned out empty; `is_matched` is only `true` for a usable match.
#[derive(Debug, Clone)]
pub struct MatchResults<'a> {
    action: Option<&'a Action>,
    parameters: Vec<RawPathParameter>,
    matched: bool,
}

impl<'a> MatchResults<'a> {
    fn unmatched() -> Self {
        MatchResults {
            action: None,
            parameters: Vec::new(),
            matched: false,
        }
    }

    #[inline]
    pub fn is_matched(&self) -> bool {
        self.matched
    }

    #[inline]
    pub fn action(&self) -> Option<&'a Action> {
        self.action
    }

    #[inline]
    pub fn parameters(&self) -> &[RawPathParameter] {
        &self.parameters
    }

    #[inline]
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::body::Body;

    fn matched(template: &str, path: &str, disallow: bool) -> Option<Vec<(String, String)>> {
        match PathTemplate::compile(template).unwrap().match_path(path, disallow) {
            PathMatch::Matched(parameters) => {
                Some(parameters.into_iter().map(|p| (p.name, p.value)).collect())
            }
            _ => None,
        }
    }

    #[test]
    fn compile() {
        #[rustfmt::skip]
        let cases = [
            ("/users",                        Some(0)),
            ("/users/{id}",                   Some(1)),
            ("/users/{ id }/name",            Some(1)),
            ("{id}",                          Some(1)),
            ("/o/{oId}/u/{uId}/c/{cId}/foo",  Some(3)),
            ("/users/{id",                    None),
            ("/users/id}",                    None),
            ("/users/{{id}}",                 None),
            ("/users/{}",                     None),
            ("/users/{a}{b}",                 None),
        ];

        for (raw, count) in cases {
            let compiled = PathTemplate::compile(raw);
            assert_eq!(compiled.as_ref().ok().map(PathTemplate::parameter_count), count, "{raw}");
            if count.is_none() {
                assert!(matches!(compiled, Err(Error::InvalidAction(_))), "{raw}");
            }
        }
    }

    #[test]
    fn matching() {
        #[rustfmt::skip]
        let cases: [(&str, &str, Option<&[&str]>); 17] = [
            ("/users",                          "/users",                         Some(&[])),
            ("/users",                          "/users/",                        Some(&[])),
            ("/users",                          "/usersX",                        None),
            ("/users/all",                      "/users/one",                     None),
            ("/users/{userId}",                 "/users/1234567",                 Some(&["1234567"])),
            ("/users/{userId}/name",            "/users/1234567/name",            Some(&["1234567"])),
            ("/users/{userId}/",                "/users/1234567/",                Some(&["1234567"])),
            ("/users/{id}",                     "/users/1234/extra",              None),
            ("/users/{id}",                     "/users//",                       Some(&["/"])),
            ("/users/{id}/data",                "/users//data",                   None),
            ("/users/{u}/emailAddresses/{e}/",  "/users/1234567/emailAddresses/890/", Some(&["1234567", "890"])),
            ("/users/{u}/emailAddresses/{e}/",  "/users/1234567/emailAddresses/890",  None),
            ("/users/{u}/emailAddresses/{e}",   "/users/1234567/emailAddresses/890/", Some(&["1234567", "890/"])),
            ("/catalogs/{c}/products/{p}/details/{d}", "/catalogs/123/products/4567/details/890", Some(&["123", "4567", "890"])),
            ("/o/{oId}/u/{uId}/foo",            "/o/1/u/2/foo",                   Some(&["1", "2"])),
            ("/o/{oId}/u/{uId}/foo",            "/o/1/u/2/c/3/foo",               None),
            ("/o/{oId}/u/{uId}/c/{cId}/foo",    "/o/1/u/2/foo",                   None),
        ];

        for (template, path, expected) in cases {
            let values = matched(template, path, true)
                .map(|parameters| parameters.into_iter().map(|(_, value)| value).collect::<Vec<_>>());
            let expected = expected.map(|values| values.iter().map(|v| v.to_string()).collect::<Vec<_>>());

            assert_eq!(values, expected, "{template} <- {path}");
        }
    }

    #[test]
    fn slash_policy() {
        let long_uri = "/o/1/u/2/c/3/foo";

        assert_eq!(matched("/o/{oId}/u/{uId}/foo", long_uri, true), None);
        assert_eq!(
            matched("/o/{oId}/u/{uId}/foo", long_uri, false),
            Some(vec![("oId".into(), "1".into()), ("uId".into(), "2/c/3".into())])
        );
        // the last parameter never spans segments
        assert_eq!(matched("/users/{id}", "/users/1/2", false), None);
    }

    #[test]
    fn empty_parameter_keeps_action() {
        let action = Action::new(0, "GET", "/users/{id}/data", "queryUserData(String id)").unwrap();
        let results = action.match_with(Method::Get, &Uri::from("/users//data"));

        assert!(!results.is_matched());
        assert!(results.action().is_some_and(|a| std::ptr::eq(a, &action)));
        assert_eq!(results.parameter_count(), 0);
    }

    #[test]
    fn no_match_has_no_action() {
        #[rustfmt::skip]
        let cases = [
            ("/users/all",   Method::Post, "/users"),
            ("/users/all",   Method::Get,  "/users/one"),
            ("/users/{id}",  Method::Get,  "/users/1234/extra"),
        ];

        for (template, method, uri) in cases {
            let action = Action::new(0, "GET", template, "queryUsers()").unwrap();
            let results = action.match_with(method, &Uri::from(uri));

            assert!(!results.is_matched(), "{uri}");
            assert!(results.action().is_none(), "{uri}");
            assert_eq!(results.parameter_count(), 0);
        }
    }

    #[test]
    fn query_is_ignored() {
        let action = Action::new(0, "GET", "/users/{userId}", "queryUser(String userId)").unwrap();
        let uri = Uri::from("/users/1234567?one=1.1&two=2.0&three=three*&three=3.3");
        let results = action.match_with(Method::Get, &uri);

        assert!(results.is_matched());
        assert_eq!(results.parameters(), [RawPathParameter::new("userId", "1234567")]);
    }

    #[test]
    fn to_spec() {
        let to = ToSpec::parse(" changeName( String userId , body:NameData nameData ) ").unwrap();

        assert_eq!(to.method_name(), "changeName");
        assert_eq!(
            to.parameters(),
            [
                MethodParameter { type_name: "String".into(), name: "userId".into(), body: false },
                MethodParameter { type_name: "NameData".into(), name: "nameData".into(), body: true },
            ]
        );
        assert_eq!(to.parameter_of("userId").map(|p| p.body), Some(false));
        assert_eq!(ToSpec::parse("queryUsers()").unwrap().signature(), "queryUsers()");

        for bad in ["queryUsers", "(String id)", "query(String)", "query(Widget id)", "query)("] {
            assert!(matches!(ToSpec::parse(bad), Err(Error::InvalidAction(_))), "{bad}");
        }
    }

    #[test]
    fn invalid_actions() {
        assert!(matches!(Action::new(0, "FETCH", "/users", "q()"), Err(Error::InvalidAction(_))));
        assert!(matches!(Action::new(0, "GET", "/users/{id", "q()"), Err(Error::InvalidAction(_))));
        assert!(matches!(Action::new(0, "GET", "/users", "q("), Err(Error::InvalidAction(_))));
    }

    #[test]
    fn map_typed_parameters() {
        let action = Action::new(
            3,
            "PUT",
            "/items/{name}/{count}/{big}/{flag}/{ratio}/{small}/{letter}",
            "update(String name, int count, Long big, boolean flag, double ratio, byte small, char letter, body:Item item)",
        )
        .unwrap();
        let request = Request::has(Method::Put).and(Body::from("{}"));
        let results = action.match_with(Method::Put, &Uri::from("/items/pen/12/9000000000/TRUE/0.5/-7/xyz"));

        let mapped = action.map(&request, results.parameters()).unwrap();

        assert_eq!(mapped.action_id, 3);
        assert_eq!(mapped.method_name, "update");
        assert_eq!(mapped.string_of("name").unwrap(), "pen");
        assert_eq!(mapped.value_of("count"), Some(&ParameterValue::Int(12)));
        assert_eq!(mapped.integer_of("big").unwrap(), 9_000_000_000);
        assert_eq!(mapped.value_of("flag"), Some(&ParameterValue::Boolean(true)));
        assert_eq!(mapped.value_of("ratio"), Some(&ParameterValue::Double(0.5)));
        assert_eq!(mapped.integer_of("small").unwrap(), -7);
        assert_eq!(mapped.value_of("letter"), Some(&ParameterValue::Char('x')));
        assert_eq!(mapped.body(), Some(&Body::from("{}")));
        assert_eq!(mapped.get(7), Some(&ParameterValue::Body(Body::from("{}"))));
        assert!(matches!(mapped.string_of("count"), Err(Error::HandlerFailure(_))));
    }

    #[test]
    fn map_bad_value() {
        let action = Action::new(0, "GET", "/users/{id}", "queryUser(int id)").unwrap();
        let results = action.match_with(Method::Get, &Uri::from("/users/abc"));

        assert!(matches!(
            action.map(&Request::has(Method::Get), results.parameters()),
            Err(Error::BadRequest(_))
        ));
    }
}

//! Macros for writing SVG markup with rust expressions interpolated as escaped text.

use std::fmt;

#[macro_export]
macro_rules! xml_format_args {
    // ends a tag
    (@inner(> $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, ">"), ($($args),*))
    };
    // ends a self-closing element
    (@inner(/> $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, " />"), ($($args),*))
    };
    // matches an attribute with a singly-hyphenated name
    (@inner($aname1:ident-$aname2:ident $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@attr($($attrs)*) -> ($($pattern),*, " ", stringify!($aname1), "-", stringify!($aname2)), ($($args),*))
    };
    // matches an attribute which fits in a rust identifier
    (@inner($aname:ident $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@attr($($attrs)*) -> ($($pattern),*, " ", stringify!($aname)), ($($args),*))
    };

    // an expression as an attribute value
    (@attr(={$avalue:expr} $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@inner($($attrs)*) -> ($($pattern),*, "=\"{}\""), ($($args,)* $crate::draw::xml::Escaped(&$avalue)))
    };
    // a literal as an attribute value, written as is
    (@attr(=$avalue:literal $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@inner($($attrs)*) -> ($($pattern),*, "=\"", $avalue, "\""), ($($args),*))
    };

    // starts a tag
    (@outer(<$name:ident $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@inner($($attrs)*) -> ($($pattern),*, "<", stringify!($name)), ($($args),*))
    };
    // matches an end tag
    (@outer(</$name:ident> $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, "</", stringify!($name), ">"), ($($args),*))
    };
    // matches a text expression
    (@outer({$text:expr} $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, "{}"), ($($args,)* $crate::draw::xml::Escaped(&$text)))
    };
    // matches a text literal
    (@outer($text:literal $($attrs:tt)*) -> ($($pattern:expr),*), ($($args:expr),*)) => {
        $crate::xml_format_args!(@outer($($attrs)*) -> ($($pattern),*, $text), ($($args),*))
    };
    // matches the end of the xml
    (@outer() -> ($($pattern:expr),*), ($($args:expr),*)) => {
        format_args!(concat!($($pattern),*, "\n"), $($args),*)
    };

    // matches the start of a tag, for opening the xml
    (<$($attrs:tt)*) => {
        $crate::xml_format_args!(@outer(<$($attrs)*) -> (""), ())
    };
}

/// Write XML
#[macro_export]
macro_rules! write_xml {
    ($dst:expr, $($attrs:tt)*) => {
        $dst.write_fmt($crate::xml_format_args!($($attrs)*))
    }
}

/// Format xml as a `String`
#[macro_export]
macro_rules! format_xml {
    ($($attrs:tt)*) => {{
        let mut s = String::new();
        std::fmt::Write::write_fmt(&mut s, $crate::xml_format_args!($($attrs)*))
            .expect("writing to a String");
        s
    }}
}

/// Displays the inner value with xml special characters replaced by entities
pub struct Escaped<'a, T: ?Sized>(pub &'a T);

impl<T: fmt::Display + ?Sized> fmt::Display for Escaped<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;
        write!(EscapingWriter(f), "{}", self.0)
    }
}

struct EscapingWriter<'a, 'b>(&'a mut fmt::Formatter<'b>);

impl fmt::Write for EscapingWriter<'_, '_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let mut written = 0;
        for (i, c) in s.char_indices() {
            let entity = match c {
                '&' => "&amp;",
                '<' => "&lt;",
                '>' => "&gt;",
                '"' => "&quot;",
                '\'' => "&#39;",
                _ => continue,
            };
            self.0.write_str(&s[written..i])?;
            self.0.write_str(entity)?;
            written = i + c.len_utf8();
        }
        self.0.write_str(&s[written..])
    }
}

#[test]
fn self_closing() {
    assert_eq!(format_xml!(<tag />), "<tag />\n");
}

#[test]
fn self_closing_attributes() {
    assert_eq!(
        format_xml!(<circle cx={1.5} cy={"2"} />),
        "<circle cx=\"1.5\" cy=\"2\" />\n"
    );
}

#[test]
fn hyphenated_attributes() {
    assert_eq!(
        format_xml!(<circle stroke-width="1" pointer-events={"auto"} />),
        "<circle stroke-width=\"1\" pointer-events=\"auto\" />\n"
    );
}

#[test]
fn element_containing_text() {
    let tooltip = String::from("3 trips (2 departures, 1 arrivals)");
    assert_eq!(
        format_xml!(<circle r="2"><title>{tooltip}</title></circle>),
        "<circle r=\"2\"><title>3 trips (2 departures, 1 arrivals)</title></circle>\n"
    );
}

#[test]
fn text_literal_containing() {
    assert_eq!(format_xml!(<tag>"text"</tag>), "<tag>text</tag>\n");
}

#[test]
fn interpolated_values_are_escaped() {
    assert_eq!(
        format_xml!(<title a={"\"q\""}>{"Mass Ave & <Main St>"}</title>),
        "<title a=\"&quot;q&quot;\">Mass Ave &amp; &lt;Main St&gt;</title>\n"
    );
    assert_eq!(Escaped("it's").to_string(), "it&#39;s");
    assert_eq!(Escaped("plain ünïcode").to_string(), "plain ünïcode");
}

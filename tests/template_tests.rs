use microtemplate::script::ErrorKind;
use microtemplate::{compile, render, Error, Template, TemplateSettings};
use serde_json::{json, Value};
use test_log::test;

fn assert_renders(text: &str, data: Value, expected: &str) {
    let template = compile(text, None).unwrap();
    assert_eq!(template.render(&data).unwrap(), expected);
}

fn people() -> Value {
    json!({"people": {"moe": "Moe", "larry": "Larry", "curly": "Curly"}})
}

#[test]
fn test_basic_interpolation() {
    assert_renders("hello: <%= name %>", json!({"name": "moe"}), "hello: moe");
}

#[test]
fn test_text_without_delimiters_is_unchanged() {
    let text = "<div><p>Just some text. Hey, I know this is silly but it aids consistency.</p></div>";
    assert_renders(text, json!({}), text);
    assert_renders("", json!({}), "");
}

#[test]
fn test_backslashes_round_trip() {
    assert_renders(r"<%= thing %> is \ridanculous", json!({"thing": "This"}), r"This is \ridanculous");
}

#[test]
fn test_quotes_round_trip() {
    assert_renders("It's its, not it's", json!({}), "It's its, not it's");
    assert_renders(
        "<% if(foo == 'bar'){ %>Statement quotes and 'quotes'.<% } %>",
        json!({"foo": "bar"}),
        "Statement quotes and 'quotes'.",
    );
}

#[test]
fn test_newlines_and_tabs_round_trip() {
    assert_renders(
        "This\n\t\tis: <%= x %>.\n\tok.\nend.",
        json!({"x": "that"}),
        "This\n\t\tis: that.\n\tok.\nend.",
    );
    assert_renders("a\r\nb\u{2028}c\u{2029}d", json!({}), "a\r\nb\u{2028}c\u{2029}d");
}

#[test]
fn test_for_in_over_object() {
    assert_renders(
        "<ul><% for (var key in people) { %><li><%= people[key] %></li><% } %></ul>",
        people(),
        "<ul><li>Moe</li><li>Larry</li><li>Curly</li></ul>",
    );
}

#[test]
fn test_escaped_characters_inside_statements() {
    assert_renders(
        r"<ul><% _.each(numbers.split('\n'), function(item) { %><li><%= item %></li><% }) %></ul>",
        json!({"numbers": "one\ntwo\nthree\nfour"}),
        "<ul><li>one</li><li>two</li><li>three</li><li>four</li></ul>",
    );
}

#[test]
fn test_namespace_collision() {
    assert_renders(
        r#"<%= pageCount %> <%= thumbnails[pageCount] %> <% _.each(thumbnails, function(p) { %><div class="thumbnail" rel="<%= p %>"></div><% }); %>"#,
        json!({
            "pageCount": 3,
            "thumbnails": {"1": "p1-thumbnail.gif", "2": "p2-thumbnail.gif", "3": "p3-thumbnail.gif"}
        }),
        concat!(
            r#"3 p3-thumbnail.gif <div class="thumbnail" rel="p1-thumbnail.gif"></div>"#,
            r#"<div class="thumbnail" rel="p2-thumbnail.gif"></div>"#,
            r#"<div class="thumbnail" rel="p3-thumbnail.gif"></div>"#,
        ),
    );
}

#[test]
fn test_interpolate_does_not_escape() {
    let raw = r#"<b>Curly & 'Moe' "Larry" `Shemp`</b>"#;
    assert_renders("<%= s %>", json!({"s": raw}), raw);
}

#[test]
fn test_escape_replaces_all_six_characters() {
    assert_renders(
        "<%- s %>",
        json!({"s": r#"<b>Curly & 'Moe' "Larry" `Shemp`</b>"#}),
        "&lt;b&gt;Curly &amp; &#x27;Moe&#x27; &quot;Larry&quot; &#x60;Shemp&#x60;&lt;/b&gt;",
    );
    assert_renders("<i><%- value %></i>", json!({"value": "<script>"}), "<i>&lt;script&gt;</i>");
}

#[test]
fn test_null_and_undefined_render_empty() {
    assert_renders("[<%= x %>][<%- x %>]", json!({"x": null}), "[][]");
    assert_renders("[<%= missing %>][<%- missing %>]", json!({}), "[][]");
}

#[test]
fn test_value_stringification() {
    assert_renders(
        "<%= n %> <%= f %> <%= b %> <%= list %> <%= zero %>",
        json!({"n": 3, "f": 2.5, "b": true, "list": [1, 2, 3], "zero": 0}),
        "3 2.5 true 1,2,3 0",
    );
}

#[test]
fn test_if_else_statements() {
    let text = "<% if (cond) { %>yes<% } else { %>no<% } %>";
    assert_renders(text, json!({"cond": true}), "yes");
    assert_renders(text, json!({"cond": false}), "no");
}

#[test]
fn test_print_appends_unescaped() {
    assert_renders("<% print('Hello, ', name, '!') %>", json!({"name": "<Moe>"}), "Hello, <Moe>!");
}

#[test]
fn test_template_local_declarations_shadow_data() {
    assert_renders("<% var name = 'local' %><%= name %>", json!({"name": "data"}), "local");
}

#[test]
fn test_unescape_helper() {
    assert_renders("<%= _.unescape(s) %>", json!({"s": "&lt;b&gt; &amp; &#x27;"}), "<b> & '");
}

#[test]
fn test_nested_callbacks_with_index() {
    assert_renders(
        "<% _.each(rows, function(row, i) { %><%= i %>:<% _.each(row, function(cell) { %>[<%= cell %>]<% }) %> <% }) %>",
        json!({"rows": [["a", "b"], ["c"]]}),
        "0:[a][b] 1:[c] ",
    );
}

#[test]
fn test_custom_mustache_delimiters() {
    let settings = TemplateSettings::default()
        .with_evaluate(Some(r"\{\{([\s\S]+?)\}\}"))
        .unwrap()
        .with_interpolate(Some(r"\{\{=([\s\S]+?)\}\}"))
        .unwrap();
    let template = compile(
        "<ul>{{ for (var key in people) { }}<li>{{= people[key] }}</li>{{ } }}</ul>",
        Some(&settings),
    )
    .unwrap();
    assert_eq!(template.render(&people()).unwrap(), "<ul><li>Moe</li><li>Larry</li><li>Curly</li></ul>");

    let quoted = compile(r#"It's its, not it's {{ if (x) { }}"quoted"{{ } }}"#, Some(&settings)).unwrap();
    assert_eq!(quoted.render(&json!({"x": true})).unwrap(), r#"It's its, not it's "quoted""#);
}

#[test]
fn test_custom_question_mark_delimiters() {
    let settings = TemplateSettings::default()
        .with_evaluate(Some(r"<\?([\s\S]+?)\?>"))
        .unwrap()
        .with_interpolate(Some(r"<\?=([\s\S]+?)\?>"))
        .unwrap();
    let template = compile(
        "<ul><? for (var key in people) { ?><li><?= people[key] ?></li><? } ?></ul>",
        Some(&settings),
    )
    .unwrap();
    assert_eq!(template.render(&people()).unwrap(), "<ul><li>Moe</li><li>Larry</li><li>Curly</li></ul>");
}

#[test]
fn test_mustache_interpolation_only() {
    let settings = TemplateSettings::default()
        .with_interpolate(Some(r"\{\{(.+?)\}\}"))
        .unwrap();
    let template = compile("Hello {{ planet }}!", Some(&settings)).unwrap();
    assert_eq!(template.render(&json!({"planet": "World"})).unwrap(), "Hello World!");
}

#[test]
fn test_disabled_evaluate_leaves_text() {
    let settings = TemplateSettings::default().with_evaluate(None).unwrap();
    let template = compile("<% raw %> <%= x %>", Some(&settings)).unwrap();
    assert_eq!(template.render(&json!({"x": 1})).unwrap(), "<% raw %> 1");
}

#[test]
fn test_named_variable() {
    let settings = TemplateSettings::default().with_variable("data");
    let template = compile("<%= data.a %>-<%= data.missing %>", Some(&settings)).unwrap();
    assert_eq!(template.render(&json!({"a": 1})).unwrap(), "1-");
    assert!(template.source().starts_with("function(data){\n"));
}

#[test]
fn test_missing_name_raises_in_named_variable_mode() {
    let settings = TemplateSettings::default().with_variable("data");
    let template = compile("<%= missing %>", Some(&settings)).unwrap();
    match template.render(&json!({})) {
        Err(Error::RenderError(err)) => {
            assert_eq!(err.kind, ErrorKind::Reference);
            assert_eq!(err.to_string(), "ReferenceError: missing is not defined");
        }
        other => panic!("expected a reference error, got {other:?}"),
    }
}

#[test]
fn test_injection_guard() {
    for variable in ["obj); alert(1); (function(", "a;b", "a b", "{a}", "a)", ""] {
        let settings = TemplateSettings::default().with_variable(variable);
        match compile("<%= 1 %>", Some(&settings)) {
            Err(Error::InvalidVariable { variable: rejected }) => assert_eq!(rejected, variable),
            other => panic!("expected {variable:?} to be rejected, got {other:?}"),
        }
    }
}

#[test]
fn test_compiling_twice_is_idempotent() {
    let text = "<% for (var i = 0; i < n; i++) { %><%- label %><%= i %> <% } %>";
    let first = compile(text, None).unwrap();
    let second = compile(text, None).unwrap();
    assert_eq!(first.source(), second.source());
    for data in [json!({"n": 3, "label": "<x>"}), json!({"n": 0, "label": ""})] {
        assert_eq!(first.render(&data).unwrap(), second.render(&data).unwrap());
    }
}

#[test]
fn test_source_reparses_to_equivalent_function() {
    let text = "<% _.each(list, function(item) { %><%- item %>,<% }) %><%= title %>";
    let template = compile(text, None).unwrap();
    let reloaded = Template::from_source(template.source()).unwrap();
    let data = json!({"list": ["<a>", "b&c"], "title": "T"});
    assert_eq!(reloaded.render(&data).unwrap(), "&lt;a&gt;,b&amp;c,T");
    assert_eq!(reloaded.render(&data).unwrap(), template.render(&data).unwrap());
}

#[test]
fn test_generation_error_carries_source() {
    let err = compile("<% for (;; { %>x", None).unwrap_err();
    assert!(matches!(err, Error::GenerationError { .. }));
    let source = err.generated_source().unwrap();
    assert!(source.starts_with("function(obj){\n"));
    assert!(source.contains("for (;; {"));
}

#[test]
fn test_runtime_errors_propagate() {
    let template = compile("<% undefinedFn() %>", None).unwrap();
    let err = template.render(&json!({})).unwrap_err();
    assert_eq!(err.to_string(), "Render error: TypeError: undefinedFn is not a function");
}

#[test]
fn test_deeply_nested_expression_is_generation_error() {
    let nested = |depth: usize| format!("<%= {}1{} %>", "(".repeat(depth), ")".repeat(depth));
    assert_renders(&nested(150), json!({}), "1");

    let err = compile(&nested(5000), None).unwrap_err();
    assert!(matches!(err, Error::GenerationError { .. }));
    assert!(err.to_string().contains("Maximum nesting depth exceeded"));
}

#[test]
fn test_oversized_values_are_render_errors() {
    for text in ["<%= 'ab'.repeat(1e19) %>", "<% var a = []; a.length = 1e18; %>"] {
        let template = compile(text, None).unwrap();
        match template.render(&json!({})) {
            Err(Error::RenderError(err)) => assert_eq!(err.kind, ErrorKind::Range, "{text}"),
            other => panic!("expected a range error for {text}, got {other:?}"),
        }
    }
}

#[test]
fn test_compound_assignment_evaluates_target_once() {
    assert_renders(
        "<% var i = 0, xs = [10, 20, 30]; xs[i++] += 1; %><%= i %>:<%= xs %>",
        json!({}),
        "1:11,20,30",
    );
    assert_renders(
        "<% var i = 0, xs = [10, 20, 30]; xs[i++]++; %><%= i %>:<%= xs %>",
        json!({}),
        "1:11,20,30",
    );
}

#[test]
fn test_block_scoped_declaration_keeps_data_name_visible() {
    assert_renders(
        "<% if (flag) { let name = 'inner'; %><%= name %>,<% } %><%= name %>",
        json!({"flag": true, "name": "outer"}),
        "inner,outer",
    );
    assert_renders(
        "<% for (let item of items) { %><%= item %><% } %>-<%= item %>",
        json!({"items": [1, 2], "item": "data"}),
        "12-data",
    );
}

#[test]
fn test_numbers_format_like_javascript() {
    assert_renders(
        "<%= (2.5).toFixed(0) %> <%= big %> <%= small %> <%= (0.125).toFixed(2) %>",
        json!({"big": 1e21, "small": 1e-7}),
        "3 1e+21 1e-7 0.13",
    );
}

#[test]
fn test_one_shot_render() {
    let rendered = render("<%- a %><%= b %>", &json!({"a": "&", "b": "&"}), None).unwrap();
    assert_eq!(rendered, "&amp;&");
}

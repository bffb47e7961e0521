use stanza::dict;
use stanza::prelude::*;
use stanza::metadata::{DictExt, LayoutName};

fn layout(name: &str, content: &str, parent: Option<&str>) -> Layout {
    let mut metadata = Dict::new();
    if let Some(parent) = parent {
        metadata.insert_key(LayoutName, parent);
    }

    Layout::new(name, content, metadata)
}

fn plain(layouts: Layouts) -> Pipeline {
    Pipeline::new(MiniJinjaEngine::new(), Converters::new(), layouts)
}

#[test]
fn front_matter_feeds_layout() {
    let pipeline = plain(Layouts::new()
        .with(layout("post", "<h1>{{page.title}}</h1>{{content}}", None)));

    let mut doc = Document::new("hi.txt", "---\nlayout: post\ntitle: Hi\n---\nHello", ".txt");
    pipeline.render(&mut doc);

    assert_eq!(doc.output, "<h1>Hi</h1>Hello");
    assert_eq!(doc.ext, ".txt");
}

#[test]
fn markdown_through_layouts() {
    let front_matter = FrontMatter::new(Yaml);
    let layouts: Layouts = [
        Layout::parse("post", "---\nlayout: default\n---\n<article>{{ content }}</article>", &front_matter),
        Layout::parse("default", "<title>{{ site.title }}: {{ page.title }}</title>\n{{ content }}", &front_matter),
    ].into_iter().collect();

    let config = Config::from_toml("[site]\ntitle = \"Blog\"\n").unwrap();
    let pipeline = Pipeline::from_config(&config, layouts);

    let mut doc = Document::new("hi.md", "---\nlayout: post\ntitle: Hi\n---\n# {{ page.title }}\n\n*there*\n", ".md");
    pipeline.render(&mut doc);

    assert_eq!(doc.ext, ".html");
    assert_eq!(doc.output, "<title>Blog: Hi</title>\n<article><h1>Hi</h1>\n<p><em>there</em></p>\n</article>");
    assert_eq!(doc.output_ext(pipeline.converters()), ".html");
}

#[test]
fn converted_documents_see_highlight_delimiters() {
    let settings = MarkdownSettings {
        highlight_prefix: "<notextile>".into(),
        highlight_suffix: "</notextile>".into(),
        ..Default::default()
    };

    let converters = Converters::new().with(MarkdownConverter::new(settings));
    let layouts = Layouts::new()
        .with(layout("code", "{{ content }}({{ highlight_suffix }})", None));

    let pipeline = Pipeline::new(MiniJinjaEngine::new(), converters, layouts);

    let mut doc = Document::new("a.md", "[{{ highlight_prefix }}]", ".md");
    pipeline.render(&mut doc);
    assert_eq!(doc.ext, ".html");
    assert_eq!(doc.output, "<p>[<notextile>]</p>\n");

    let mut doc = Document::new("b.md", "---\nlayout: code\n---\nx", ".md");
    pipeline.render(&mut doc);
    assert_eq!(doc.output, "<p>x</p>\n(</notextile>)");

    let mut doc = Document::new("c.txt", "[{{ highlight_prefix }}]", ".txt");
    pipeline.render(&mut doc);
    assert_eq!(doc.output, "[]");
}

#[test]
fn cyclic_layouts_terminate() {
    let pipeline = plain(Layouts::new()
        .with(layout("a", "A({{ content }})", Some("b")))
        .with(layout("b", "B({{ content }})", Some("a"))));

    let mut doc = Document::new("x.txt", "---\nlayout: a\n---\nx", ".txt");
    pipeline.render(&mut doc);
    assert_eq!(doc.output, "B(A(x))");
}

#[test]
fn malformed_front_matter_falls_back_to_defaults() {
    let pipeline = plain(Layouts::new().with(layout("post", "[{{ content }}]", None)))
        .with_post_defaults(dict! { "layout" => "post" });

    let mut post = Document::post("bad.txt", "---\ntitle: [unclosed\n---\nbody", ".txt");
    pipeline.render(&mut post);

    assert_eq!(post.metadata, dict! { "layout" => "post" });
    assert_eq!(post.output, "[body]");
}

#[test]
fn posts_render_extended_content() {
    let config = Config::from_toml("[post_defaults]\nlayout = \"post\"\n").unwrap();
    let layouts = Layouts::new()
        .with(layout("post", "<main>{{ page.content }}</main><more>{{ page.extended }}</more>", None));

    let pipeline = Pipeline::from_config(&config, layouts);
    let raw = "---\nextended: <!--more-->\n---\nIntro\n<!--more-->\nRest of *it*\n";
    let mut post = Document::post("long.md", raw, ".md");
    pipeline.render(&mut post);

    assert_eq!(post.body, "<p>Intro</p>\n");
    assert_eq!(post.extended.as_deref(), Some("<p>Rest of <em>it</em></p>\n"));
    assert_eq!(post.output, "<main><p>Intro</p>\n</main><more><p>Rest of <em>it</em></p>\n</more>");
}

#[test]
fn render_all_renders_each_document() {
    let pipeline = plain(Layouts::new().with(layout("wrap", "<{{ content }}>", None)))
        .with_site(dict! { "site" => dict! { "name" => "s" } });

    let mut documents: Vec<Document> = (0..32)
        .map(|i| {
            let raw = format!("---\nlayout: wrap\nn: {i}\n---\n{{{{ site.name }}}}{{{{ page.n }}}}");
            Document::new(format!("{i}.txt"), raw, ".txt")
        })
        .collect();

    pipeline.render_all(&mut documents);
    for (i, doc) in documents.iter().enumerate() {
        assert_eq!(doc.output, format!("<s{i}>"));
    }
}

#[test]
fn config_file_drives_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stanza.toml");
    std::fs::write(&path, "title = \"Notes\"\n\n[markdown]\nextensions = [\"text\"]\n").unwrap();

    let config = Config::read(&path).unwrap();
    let pipeline = Pipeline::from_config(&config, Layouts::new());

    let mut doc = Document::new("a.text", "{{ site.title }}", ".text");
    pipeline.render(&mut doc);
    assert_eq!(doc.output, "<p>Notes</p>\n");

    let mut doc = Document::new("a.md", "*{{ site.title }}*", ".md");
    pipeline.render(&mut doc);
    assert_eq!(doc.output, "*Notes*");
}

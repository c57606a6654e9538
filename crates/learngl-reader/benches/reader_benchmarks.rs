//! Benchmarks for rendering with the standard component set.
//!
//! The annotated `code` renderer runs the annotator once per inline code
//! span, so documents heavy in inline code are the interesting case.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use learngl_core::FunctionTable;
use learngl_mdx::compile;
use learngl_reader::standard_registry;
use std::hint::black_box;
use std::sync::Arc;

const SECTION: &str = r#"## 텍스처

`glGenTextures(1, &texture)`로 텍스처를 만들고 `glBindTexture(GL_TEXTURE_2D, texture)`로
바인딩합니다. 필터링은 `glTexParameteri`로, 유니폼은 `glUniform1i(loc, 0)`로 설정합니다.

<TranslatorNote type="clarification">
밉맵은 `glGenerateMipmap`으로 생성합니다.
</TranslatorNote>

```cpp
unsigned int texture;
glGenTextures(1, &texture);
```

"#;

fn bench_render(c: &mut Criterion) {
    let registry = Arc::new(standard_registry(FunctionTable::builtin()));
    let mut group = c.benchmark_group("standard_render");

    for sections in [1, 10, 50] {
        let text = SECTION.repeat(sections);
        let compiled = compile(&text, &registry).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            &compiled,
            |b, compiled| {
                b.iter(|| black_box(compiled).render_html());
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);

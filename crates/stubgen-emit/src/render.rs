//! Fragment renderers, keyed by (artifact kind, section role).
//!
//! Every renderer is a pure function `(&SchemaFile, &GeneratorOptions) ->
//! String`. The assembler and aggregator never name individual template
//! functions; they iterate the fixed role orders ([`SECTION_ORDER`],
//! [`BATCH_ROLE_ORDER`]) and look the function up here. Fragment order is
//! part of the contract — a later fragment may assume earlier ones already
//! exist in the stream (include guards, namespace openers).

use stubgen_core::{
    GeneratorOptions, Method, SchemaFile, Service, Streaming, strip_schema_extension,
};

/// A fragment renderer for one (kind, role) pair.
pub type RenderFn = fn(&SchemaFile, &GeneratorOptions) -> String;

/// Per-file artifact kinds, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// `<stem>.stub.h`
    StubHeader,
    /// `<stem>.stub.cc`
    StubSource,
    /// `<stem>.grpc.pb.h`
    BindingHeader,
    /// `<stem>.grpc.pb.cc`
    BindingSource,
    /// `<stem>_mock.grpc.pb.h`
    MockHeader,
}

impl ArtifactKind {
    /// Derive the output filename for a schema file stem.
    #[must_use]
    pub fn filename(self, stem: &str) -> String {
        match self {
            Self::StubHeader => format!("{stem}.stub.h"),
            Self::StubSource => format!("{stem}.stub.cc"),
            Self::BindingHeader => format!("{stem}.grpc.pb.h"),
            Self::BindingSource => format!("{stem}.grpc.pb.cc"),
            Self::MockHeader => format!("{stem}_mock.grpc.pb.h"),
        }
    }
}

/// Section roles within one per-file artifact, in concatenation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRole {
    /// Banner and include guard.
    Prologue,
    /// Include directives.
    Includes,
    /// Per-service declarations or definitions.
    ServiceBody,
    /// Guard close / footer.
    Epilogue,
}

/// Fixed concatenation order for per-file artifacts.
pub const SECTION_ORDER: [SectionRole; 4] = [
    SectionRole::Prologue,
    SectionRole::Includes,
    SectionRole::ServiceBody,
    SectionRole::Epilogue,
];

/// Look up the renderer for a per-file (kind, role) pair.
#[must_use]
pub fn section(kind: ArtifactKind, role: SectionRole) -> RenderFn {
    use ArtifactKind as K;
    use SectionRole as R;
    match (kind, role) {
        (K::StubHeader, R::Prologue) => stub_header_prologue,
        (K::StubHeader, R::Includes) => stub_header_includes,
        (K::StubHeader, R::ServiceBody) => stub_header_services,
        (K::StubHeader, R::Epilogue) => stub_header_epilogue,
        (K::StubSource, R::Prologue) => stub_source_prologue,
        (K::StubSource, R::Includes) => stub_source_includes,
        (K::StubSource, R::ServiceBody) => stub_source_services,
        (K::StubSource, R::Epilogue) => source_epilogue,
        (K::BindingHeader, R::Prologue) => binding_header_prologue,
        (K::BindingHeader, R::Includes) => binding_header_includes,
        (K::BindingHeader, R::ServiceBody) => binding_header_services,
        (K::BindingHeader, R::Epilogue) => binding_header_epilogue,
        (K::BindingSource, R::Prologue) => binding_source_prologue,
        (K::BindingSource, R::Includes) => binding_source_includes,
        (K::BindingSource, R::ServiceBody) => binding_source_services,
        (K::BindingSource, R::Epilogue) => source_epilogue,
        (K::MockHeader, R::Prologue) => mock_prologue,
        (K::MockHeader, R::Includes) => mock_includes,
        (K::MockHeader, R::ServiceBody) => mock_services,
        (K::MockHeader, R::Epilogue) => mock_epilogue,
    }
}

/// Batch artifact kinds, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    /// `services.h`
    ServicesHeader,
    /// `services.cc`
    ServicesSource,
    /// `packages.xml`
    PackageManifest,
}

/// All batch kinds in emission order.
pub const BATCH_KINDS: [BatchKind; 3] = [
    BatchKind::ServicesHeader,
    BatchKind::ServicesSource,
    BatchKind::PackageManifest,
];

impl BatchKind {
    /// Fixed output filename for this batch artifact.
    #[must_use]
    pub const fn filename(self) -> &'static str {
        match self {
            Self::ServicesHeader => "services.h",
            Self::ServicesSource => "services.cc",
            Self::PackageManifest => "packages.xml",
        }
    }
}

/// Section roles within one batch artifact.
///
/// `Prologue` and `Epilogue` render from the batch's first file only;
/// `Declarations` and `Body` render once per file. Declarations of all files
/// precede bodies of any file — definitions reference declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchRole {
    /// Batch framing, from the first file.
    Prologue,
    /// Per-file forward declarations or includes.
    Declarations,
    /// Per-file definitions.
    Body,
    /// Batch framing close, from the first file.
    Epilogue,
}

/// Fixed concatenation order for batch artifacts.
pub const BATCH_ROLE_ORDER: [BatchRole; 4] = [
    BatchRole::Prologue,
    BatchRole::Declarations,
    BatchRole::Body,
    BatchRole::Epilogue,
];

/// Look up the renderer for a batch (kind, role) pair.
#[must_use]
pub fn batch_section(kind: BatchKind, role: BatchRole) -> RenderFn {
    use BatchKind as K;
    use BatchRole as R;
    match (kind, role) {
        (K::ServicesHeader, R::Prologue) => services_header_prologue,
        (K::ServicesHeader, R::Declarations) => services_header_declarations,
        (K::ServicesHeader, R::Body) => services_header_body,
        (K::ServicesHeader, R::Epilogue) => services_header_epilogue,
        (K::ServicesSource, R::Prologue) => services_source_prologue,
        (K::ServicesSource, R::Declarations) => services_source_includes,
        (K::ServicesSource, R::Body) => services_source_body,
        (K::ServicesSource, R::Epilogue) => services_source_epilogue,
        (K::PackageManifest, R::Prologue) => manifest_prologue,
        (K::PackageManifest, R::Declarations) => manifest_packages,
        (K::PackageManifest, R::Body) => manifest_services,
        (K::PackageManifest, R::Epilogue) => manifest_epilogue,
    }
}

// ---------------------------------------------------------------------------
// Shared template helpers
// ---------------------------------------------------------------------------

fn banner(file: &SchemaFile) -> String {
    format!(
        "// Generated by protoc-gen-cppstub. Do not edit!\n// source: {}\n\n",
        file.name
    )
}

fn guard_token(stem: &str, tag: &str) -> String {
    let ident: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("GRPC_{tag}_{ident}_H")
}

/// A grpc runtime include, honoring `use_system_headers` and
/// `grpc_search_path`.
fn grpc_include(opts: &GeneratorOptions, path: &str) -> String {
    if opts.use_system_headers {
        format!("#include <{path}>\n")
    } else if opts.grpc_search_path.is_empty() {
        format!("#include \"{path}\"\n")
    } else {
        let sep = if opts.grpc_search_path.ends_with('/') {
            ""
        } else {
            "/"
        };
        format!("#include \"{}{sep}{path}\"\n", opts.grpc_search_path)
    }
}

fn local_include(path: &str) -> String {
    format!("#include \"{path}\"\n")
}

/// The message header generated by the base protobuf plugin for this file.
fn message_header_include(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    local_include(&format!("{}{}", file.stem(), opts.message_header_ext()))
}

/// Includes for the message headers of every imported schema file, when
/// `include_import_headers` is set.
fn import_includes(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    if !opts.include_import_headers {
        return String::new();
    }
    file.imports
        .iter()
        .map(|dep| {
            local_include(&format!(
                "{}{}",
                strip_schema_extension(dep),
                opts.message_header_ext()
            ))
        })
        .collect()
}

fn additional_includes(opts: &GeneratorOptions) -> String {
    opts.additional_header_includes
        .iter()
        .map(|path| local_include(path))
        .collect()
}

fn namespace_open(opts: &GeneratorOptions) -> String {
    if opts.services_namespace.is_empty() {
        String::new()
    } else {
        format!("namespace {} {{\n\n", opts.services_namespace)
    }
}

fn namespace_close(opts: &GeneratorOptions) -> String {
    if opts.services_namespace.is_empty() {
        String::new()
    } else {
        format!("}}  // namespace {}\n\n", opts.services_namespace)
    }
}

fn service_full_name(file: &SchemaFile, service: &Service) -> String {
    if file.package.is_empty() {
        service.name.clone()
    } else {
        format!("{}.{}", file.package, service.name)
    }
}

fn client_method_decl(method: &Method) -> String {
    let Method {
        name,
        input_type: input,
        output_type: output,
        streaming,
    } = method;
    match streaming {
        Streaming::Unary => format!(
            "  ::grpc::Status {name}(::grpc::ClientContext* context, \
             const {input}& request, {output}* response);\n"
        ),
        Streaming::ClientStreaming => format!(
            "  std::unique_ptr<::grpc::ClientWriter<{input}>> \
             {name}(::grpc::ClientContext* context, {output}* response);\n"
        ),
        Streaming::ServerStreaming => format!(
            "  std::unique_ptr<::grpc::ClientReader<{output}>> \
             {name}(::grpc::ClientContext* context, const {input}& request);\n"
        ),
        Streaming::Bidi => format!(
            "  std::unique_ptr<::grpc::ClientReaderWriter<{input}, {output}>> \
             {name}(::grpc::ClientContext* context);\n"
        ),
    }
}

fn virtual_method_decl(method: &Method) -> String {
    let Method {
        name,
        input_type: input,
        output_type: output,
        streaming,
    } = method;
    match streaming {
        Streaming::Unary => format!(
            "    virtual ::grpc::Status {name}(::grpc::ClientContext* context, \
             const {input}& request, {output}* response) = 0;\n"
        ),
        Streaming::ClientStreaming => format!(
            "    virtual ::grpc::ClientWriterInterface<{input}>* \
             {name}Raw(::grpc::ClientContext* context, {output}* response) = 0;\n"
        ),
        Streaming::ServerStreaming => format!(
            "    virtual ::grpc::ClientReaderInterface<{output}>* \
             {name}Raw(::grpc::ClientContext* context, const {input}& request) = 0;\n"
        ),
        Streaming::Bidi => format!(
            "    virtual ::grpc::ClientReaderWriterInterface<{input}, {output}>* \
             {name}Raw(::grpc::ClientContext* context) = 0;\n"
        ),
    }
}

fn mock_method_decl(method: &Method) -> String {
    let Method {
        name,
        input_type: input,
        output_type: output,
        streaming,
    } = method;
    match streaming {
        Streaming::Unary => format!(
            "  MOCK_METHOD(::grpc::Status, {name}, (::grpc::ClientContext*, \
             const {input}&, {output}*), (override));\n"
        ),
        Streaming::ClientStreaming => format!(
            "  MOCK_METHOD(::grpc::ClientWriterInterface<{input}>*, {name}Raw, \
             (::grpc::ClientContext*, {output}*), (override));\n"
        ),
        Streaming::ServerStreaming => format!(
            "  MOCK_METHOD(::grpc::ClientReaderInterface<{output}>*, {name}Raw, \
             (::grpc::ClientContext*, const {input}&), (override));\n"
        ),
        Streaming::Bidi => format!(
            "  MOCK_METHOD(::grpc::ClientReaderWriterInterface<{input}, {output}>*, \
             {name}Raw, (::grpc::ClientContext*), (override));\n"
        ),
    }
}

// ---------------------------------------------------------------------------
// Stub header / source
// ---------------------------------------------------------------------------

fn stub_header_prologue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    let token = guard_token(file.stem(), "STUB");
    format!("{}#ifndef {token}\n#define {token}\n\n", banner(file))
}

fn stub_header_includes(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = message_header_include(file, opts);
    code += &grpc_include(opts, "grpcpp/channel.h");
    code += &grpc_include(opts, "grpcpp/support/status.h");
    code += &additional_includes(opts);
    code += &import_includes(file, opts);
    code.push('\n');
    code
}

fn stub_header_services(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = namespace_open(opts);
    for service in &file.services {
        code += &format!("class {}Stub final {{\n public:\n", service.name);
        code += &format!(
            "  explicit {}Stub(const std::shared_ptr<::grpc::ChannelInterface>& channel);\n",
            service.name
        );
        for method in &service.methods {
            code += &client_method_decl(method);
        }
        code += " private:\n  std::shared_ptr<::grpc::ChannelInterface> channel_;\n};\n\n";
    }
    code += &namespace_close(opts);
    code
}

fn stub_header_epilogue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    format!("#endif  // {}\n", guard_token(file.stem(), "STUB"))
}

fn stub_source_prologue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    banner(file)
}

fn stub_source_includes(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    let stem = file.stem();
    let mut code = local_include(&format!("{stem}.stub.h"));
    code += &local_include(&format!("{stem}.grpc.pb.h"));
    code.push('\n');
    code
}

fn stub_source_services(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = namespace_open(opts);
    for service in &file.services {
        let stub = format!("{}Stub", service.name);
        code += &format!(
            "{stub}::{stub}(const std::shared_ptr<::grpc::ChannelInterface>& channel)\n    \
             : channel_(channel) {{}}\n\n"
        );
        for method in &service.methods {
            if method.streaming == Streaming::Unary {
                code += &format!(
                    "::grpc::Status {stub}::{name}(::grpc::ClientContext* context, \
                     const {input}& request, {output}* response) {{\n  \
                     return {svc}::NewStub(channel_)->{name}(context, request, response);\n}}\n\n",
                    name = method.name,
                    input = method.input_type,
                    output = method.output_type,
                    svc = service.name,
                );
            } else {
                // Streaming wrappers delegate to the binding-layer stub.
                code += &format!(
                    "// {name}: streaming call, forwarded to {svc}::Stub.\n\n",
                    name = method.name,
                    svc = service.name,
                );
            }
        }
    }
    code += &namespace_close(opts);
    code
}

// ---------------------------------------------------------------------------
// Binding header / source
// ---------------------------------------------------------------------------

fn binding_header_prologue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    let token = guard_token(file.stem(), "PB");
    format!("{}#ifndef {token}\n#define {token}\n\n", banner(file))
}

fn binding_header_includes(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = message_header_include(file, opts);
    code += &grpc_include(opts, "grpcpp/generic/generic_stub.h");
    code += &grpc_include(opts, "grpcpp/support/async_stream.h");
    code += &grpc_include(opts, "grpcpp/support/status.h");
    code += &grpc_include(opts, "grpcpp/impl/service_type.h");
    code += &additional_includes(opts);
    code += &import_includes(file, opts);
    code.push('\n');
    code
}

fn binding_header_services(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = namespace_open(opts);
    for service in &file.services {
        code += &format!(
            "class {name} final {{\n public:\n  \
             static constexpr char const* service_full_name() {{\n    \
             return \"{full}\";\n  }}\n",
            name = service.name,
            full = service_full_name(file, service),
        );
        code += "  class StubInterface {\n   public:\n    virtual ~StubInterface() {}\n";
        for method in &service.methods {
            code += &virtual_method_decl(method);
        }
        code += "  };\n";
        code += "  static std::unique_ptr<StubInterface> NewStub(\n      \
                 const std::shared_ptr<::grpc::ChannelInterface>& channel);\n";
        code += "  class Service : public ::grpc::Service {\n   public:\n    \
                 Service();\n    ~Service() override;\n  };\n";
        code += "};\n\n";
    }
    code += &namespace_close(opts);
    code
}

fn binding_header_epilogue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    format!("#endif  // {}\n", guard_token(file.stem(), "PB"))
}

fn binding_source_prologue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    banner(file)
}

fn binding_source_includes(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = local_include(&format!("{}.grpc.pb.h", file.stem()));
    code += &grpc_include(opts, "grpcpp/impl/channel_interface.h");
    code += &grpc_include(opts, "grpcpp/impl/rpc_service_method.h");
    code.push('\n');
    code
}

fn binding_source_services(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = namespace_open(opts);
    for service in &file.services {
        code += &format!(
            "static const char* {name}_method_names[] = {{\n",
            name = service.name
        );
        for method in &service.methods {
            code += &format!(
                "    \"/{full}/{method}\",\n",
                full = service_full_name(file, service),
                method = method.name,
            );
        }
        code += "};\n\n";
        code += &format!(
            "std::unique_ptr<{name}::StubInterface> {name}::NewStub(\n    \
             const std::shared_ptr<::grpc::ChannelInterface>& channel) {{\n  \
             return std::unique_ptr<StubInterface>(new Stub(channel));\n}}\n\n",
            name = service.name,
        );
        code += &format!(
            "{name}::Service::Service() {{\n",
            name = service.name
        );
        for (index, method) in service.methods.iter().enumerate() {
            code += &format!(
                "  AddMethod(new ::grpc::internal::RpcServiceMethod(\n      \
                 {name}_method_names[{index}], ::grpc::internal::RpcMethod::{kind}, nullptr));\n",
                name = service.name,
                kind = rpc_method_kind(method.streaming),
            );
        }
        code += "}\n\n";
        code += &format!("{name}::Service::~Service() {{}}\n\n", name = service.name);
    }
    code += &namespace_close(opts);
    code
}

const fn rpc_method_kind(streaming: Streaming) -> &'static str {
    match streaming {
        Streaming::Unary => "NORMAL_RPC",
        Streaming::ClientStreaming => "CLIENT_STREAMING",
        Streaming::ServerStreaming => "SERVER_STREAMING",
        Streaming::Bidi => "BIDI_STREAMING",
    }
}

fn source_epilogue(_file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    String::new()
}

// ---------------------------------------------------------------------------
// Mock header
// ---------------------------------------------------------------------------

fn mock_prologue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    let token = guard_token(file.stem(), "MOCK");
    format!("{}#ifndef {token}\n#define {token}\n\n", banner(file))
}

fn mock_includes(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = local_include(&format!("{}.grpc.pb.h", file.stem()));
    if opts.gmock_search_path.is_empty() {
        if opts.use_system_headers {
            code += "#include <gmock/gmock.h>\n";
        } else {
            code += &local_include("gmock/gmock.h");
        }
    } else {
        let sep = if opts.gmock_search_path.ends_with('/') {
            ""
        } else {
            "/"
        };
        code += &local_include(&format!("{}{sep}gmock/gmock.h", opts.gmock_search_path));
    }
    code.push('\n');
    code
}

fn mock_services(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = namespace_open(opts);
    for service in &file.services {
        code += &format!(
            "class Mock{name}Stub : public {name}::StubInterface {{\n public:\n",
            name = service.name
        );
        for method in &service.methods {
            code += &mock_method_decl(method);
        }
        code += "};\n\n";
    }
    code += &namespace_close(opts);
    code
}

fn mock_epilogue(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    format!("#endif  // {}\n", guard_token(file.stem(), "MOCK"))
}

// ---------------------------------------------------------------------------
// Batch: services.h / services.cc / packages.xml
// ---------------------------------------------------------------------------

fn batch_banner(first: &SchemaFile) -> String {
    format!(
        "// Generated by protoc-gen-cppstub. Do not edit!\n\
         // Aggregated services for the compilation unit of: {}\n\n",
        first.name
    )
}

fn services_header_prologue(first: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = batch_banner(first);
    code += "#ifndef GRPC_SERVICES_H\n#define GRPC_SERVICES_H\n\n";
    code += &grpc_include(opts, "grpcpp/support/status.h");
    code.push('\n');
    code += &namespace_open(opts);
    code
}

fn services_header_declarations(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    file.services
        .iter()
        .map(|service| format!("class {}Client;\n", service.name))
        .collect()
}

fn services_header_body(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    let mut code = String::new();
    for service in &file.services {
        code += &format!(
            "\n// {name} ({file})\nclass {name}Client {{\n public:\n",
            name = service.name,
            file = file.name,
        );
        for method in &service.methods {
            code += &client_method_decl(method);
        }
        code += "};\n";
    }
    code
}

fn services_header_epilogue(_first: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = String::from("\n");
    code += &namespace_close(opts);
    code += "#endif  // GRPC_SERVICES_H\n";
    code
}

fn services_source_prologue(first: &SchemaFile, _opts: &GeneratorOptions) -> String {
    let mut code = batch_banner(first);
    code += &local_include("services.h");
    code
}

fn services_source_includes(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    local_include(&format!("{}.grpc.pb.h", file.stem()))
}

fn services_source_body(file: &SchemaFile, opts: &GeneratorOptions) -> String {
    let mut code = String::new();
    for service in &file.services {
        code += "\n";
        code += &namespace_open(opts);
        for method in &service.methods {
            if method.streaming == Streaming::Unary {
                code += &format!(
                    "::grpc::Status {svc}Client::{name}(::grpc::ClientContext* context, \
                     const {input}& request, {output}* response) {{\n  \
                     return {svc}::NewStub(channel_)->{name}(context, request, response);\n}}\n",
                    svc = service.name,
                    name = method.name,
                    input = method.input_type,
                    output = method.output_type,
                );
            }
        }
        code += &namespace_close(opts);
    }
    code
}

fn services_source_epilogue(_first: &SchemaFile, _opts: &GeneratorOptions) -> String {
    String::new()
}

fn manifest_prologue(_first: &SchemaFile, _opts: &GeneratorOptions) -> String {
    String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<packages>\n")
}

fn manifest_packages(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    format!(
        "  <package name=\"{}\" file=\"{}\"/>\n",
        file.package, file.name
    )
}

fn manifest_services(file: &SchemaFile, _opts: &GeneratorOptions) -> String {
    let mut code = format!("  <services file=\"{}\">\n", file.name);
    for service in &file.services {
        code += &format!("    <service name=\"{}\">\n", service.name);
        for method in &service.methods {
            code += &format!(
                "      <method name=\"{}\" input=\"{}\" output=\"{}\"/>\n",
                method.name, method.input_type, method.output_type
            );
        }
        code += "    </service>\n";
    }
    code += "  </services>\n";
    code
}

fn manifest_epilogue(_first: &SchemaFile, _opts: &GeneratorOptions) -> String {
    String::from("</packages>\n")
}

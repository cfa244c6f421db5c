/// WGSL shader for lit meshes and shadow-proxy decals.
///
/// Light vectors are premultiplied by intensity on the CPU. The `w` lane of
/// each light color is 1.0 when that light samples its shadow layer.
pub const SCENE_SHADER: &str = r#"
const PI: f32 = 3.141592653589793;

struct Globals {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    ambient: vec4<f32>,
    directional_color: vec4<f32>,
    directional_direction: vec4<f32>,
    spot_color: vec4<f32>,
    spot_position: vec4<f32>,
    spot_direction: vec4<f32>,
    spot_params: vec4<f32>,
    point_color: vec4<f32>,
    point_position: vec4<f32>,
    point_params: vec4<f32>,
    // x: filter mode (0 off, 1 pcf, 2 soft pcf), y: texel size, z: depth bias
    shadow_params: vec4<f32>,
    // filter radius per light: x directional, y spot, z point
    shadow_radius: vec4<f32>,
    light_view_proj: array<mat4x4<f32>, 8>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;
@group(0) @binding(1)
var shadow_map: texture_depth_2d_array;
@group(0) @binding(2)
var shadow_sampler: sampler_comparison;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
    // x: metalness, y: roughness, z: 1.0 for decals, w: receives shadows
    @location(8) material: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) color: vec4<f32>,
    @location(4) material: vec4<f32>,
};

@vertex
fn vs_main(vertex: VertexInput, instance: InstanceInput) -> VertexOutput {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    let world_pos = model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world_pos;
    out.world_position = world_pos.xyz;
    out.world_normal = normalize(world_normal);
    out.uv = vertex.uv;
    out.color = instance.color;
    out.material = instance.material;
    return out;
}

fn shadow_factor(layer: i32, world_position: vec3<f32>, normal: vec3<f32>, radius: f32) -> f32 {
    let mode = globals.shadow_params.x;
    if (mode < 0.5) {
        return 1.0;
    }
    let clip = globals.light_view_proj[layer] * vec4<f32>(world_position + normal * 0.01, 1.0);
    if (clip.w <= 0.0) {
        return 1.0;
    }
    let ndc = clip.xyz / clip.w;
    if (abs(ndc.x) > 1.0 || abs(ndc.y) > 1.0 || ndc.z < 0.0 || ndc.z > 1.0) {
        return 1.0;
    }
    let uv = vec2<f32>(ndc.x * 0.5 + 0.5, -ndc.y * 0.5 + 0.5);
    let depth = ndc.z - globals.shadow_params.z;

    if (mode < 1.5) {
        return textureSampleCompareLevel(shadow_map, shadow_sampler, uv, layer, depth);
    }

    let spread = globals.shadow_params.y * clamp(radius * 0.25, 1.0, 4.0);
    var lit = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * spread;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, layer, depth);
        }
    }
    return lit / 9.0;
}

fn point_shadow_layer(light_to_fragment: vec3<f32>) -> i32 {
    let a = abs(light_to_fragment);
    if (a.x >= a.y && a.x >= a.z) {
        return select(3, 2, light_to_fragment.x > 0.0);
    }
    if (a.y >= a.z) {
        return select(5, 4, light_to_fragment.y > 0.0);
    }
    return select(7, 6, light_to_fragment.z > 0.0);
}

fn distance_attenuation(distance: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(distance, decay), 0.01);
    if (cutoff > 0.0) {
        let ratio = distance / cutoff;
        let window = clamp(1.0 - ratio * ratio * ratio * ratio, 0.0, 1.0);
        falloff *= window * window;
    }
    return falloff;
}

fn brdf(n: vec3<f32>, v: vec3<f32>, l: vec3<f32>, base: vec3<f32>, metalness: f32, roughness: f32) -> vec3<f32> {
    let n_dot_l = max(dot(n, l), 0.0);
    let h = normalize(l + v);
    let n_dot_h = max(dot(n, h), 0.0);
    let r4 = max(pow(roughness, 4.0), 0.0001);
    let shininess = clamp(2.0 / r4 - 2.0, 1.0, 2048.0);
    let f0 = mix(vec3<f32>(0.04), base, metalness);
    let specular = f0 * pow(n_dot_h, shininess) * (shininess + 8.0) / (8.0 * PI);
    let diffuse = base * (1.0 - metalness);
    return (diffuse + specular) * n_dot_l;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if (in.material.z > 0.5) {
        // Shadow decal: black, fading radially from the center.
        let falloff = 1.0 - smoothstep(0.0, 0.5, length(in.uv - vec2<f32>(0.5)));
        return vec4<f32>(0.0, 0.0, 0.0, in.color.a * falloff);
    }

    let n = normalize(in.world_normal);
    let v = normalize(globals.camera_position.xyz - in.world_position);
    let base = in.color.rgb;
    let metalness = in.material.x;
    let roughness = in.material.y;
    let receives = in.material.w > 0.5;

    var color = base * (1.0 - metalness) * globals.ambient.rgb;

    // Directional
    let dl = -globals.directional_direction.xyz;
    var dir_shadow = 1.0;
    if (receives && globals.directional_color.w > 0.5) {
        dir_shadow = shadow_factor(0, in.world_position, n, globals.shadow_radius.x);
    }
    color += brdf(n, v, dl, base, metalness, roughness) * globals.directional_color.rgb * dir_shadow;

    // Spot
    let to_spot = globals.spot_position.xyz - in.world_position;
    let spot_distance = length(to_spot);
    let sl = to_spot / max(spot_distance, 0.0001);
    let angle_cos = dot(-sl, globals.spot_direction.xyz);
    let cone = smoothstep(globals.spot_direction.w, globals.spot_params.x, angle_cos);
    if (cone > 0.0) {
        var spot_shadow = 1.0;
        if (receives && globals.spot_color.w > 0.5) {
            spot_shadow = shadow_factor(1, in.world_position, n, globals.shadow_radius.y);
        }
        let attenuation = distance_attenuation(spot_distance, globals.spot_position.w, globals.spot_params.y);
        color += brdf(n, v, sl, base, metalness, roughness) * globals.spot_color.rgb * cone * attenuation * spot_shadow;
    }

    // Point
    let to_point = globals.point_position.xyz - in.world_position;
    let point_distance = length(to_point);
    let pl = to_point / max(point_distance, 0.0001);
    var point_shadow = 1.0;
    if (receives && globals.point_color.w > 0.5) {
        let layer = point_shadow_layer(-to_point);
        point_shadow = shadow_factor(layer, in.world_position, n, globals.shadow_radius.z);
    }
    let point_attenuation = distance_attenuation(point_distance, globals.point_position.w, globals.point_params.x);
    color += brdf(n, v, pl, base, metalness, roughness) * globals.point_color.rgb * point_attenuation * point_shadow;

    return vec4<f32>(color, in.color.a);
}
"#;

/// WGSL shader writing depth only, one light layer per pass.
pub const SHADOW_SHADER: &str = r#"
struct ShadowPass {
    light_view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> pass_uniforms: ShadowPass;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct InstanceInput {
    @location(3) model_0: vec4<f32>,
    @location(4) model_1: vec4<f32>,
    @location(5) model_2: vec4<f32>,
    @location(6) model_3: vec4<f32>,
    @location(7) color: vec4<f32>,
    @location(8) material: vec4<f32>,
};

@vertex
fn vs_shadow(vertex: VertexInput, instance: InstanceInput) -> @builtin(position) vec4<f32> {
    let model = mat4x4<f32>(
        instance.model_0,
        instance.model_1,
        instance.model_2,
        instance.model_3,
    );
    return pass_uniforms.light_view_proj * model * vec4<f32>(vertex.position, 1.0);
}
"#;

/// WGSL shader for the shadow camera helper wireframes.
pub const LINE_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

struct LineVertex {
    @location(0) position: vec3<f32>,
    @location(1) color: vec4<f32>,
};

struct LineOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec4<f32>,
};

@vertex
fn vs_line(vertex: LineVertex) -> LineOutput {
    var out: LineOutput;
    out.clip_position = globals.view_proj * vec4<f32>(vertex.position, 1.0);
    out.color = vertex.color;
    return out;
}

@fragment
fn fs_line(in: LineOutput) -> @location(0) vec4<f32> {
    return in.color;
}
"#;
